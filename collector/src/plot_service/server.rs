use crate::plot_service::store::PlotStore;
use anyhow::Context;
use collectcore::backend::{FlagSubmission, LabelSubmission};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{mpsc, Arc, RwLock};
use std::thread;
use tokio::runtime::Builder;
use warp::http::StatusCode;
use warp::reply::Reply;
use warp::Filter;

#[derive(Debug, Deserialize)]
struct ImageryQuery {
    #[serde(rename = "institutionId")]
    institution_id: String,
}

/// Stand-in plot service hosting the labeling backend's REST surface over
/// an in-memory store, from a background thread.
pub struct PlotService {
    addr: SocketAddr,
}

impl PlotService {
    pub fn spawn(store: Arc<RwLock<PlotStore>>, port: u16) -> anyhow::Result<Self> {
        let bind = SocketAddr::from(([127, 0, 0, 1], port));
        let store_filter = warp::any().map(move || store.clone());

        let project_route = warp::path!("get-project-by-id" / String)
            .and(warp::get())
            .and(store_filter.clone())
            .map(|project_id: String, store: Arc<RwLock<PlotStore>>| {
                let guard = store.read().unwrap();
                match guard.project(&project_id) {
                    Some(project) => warp::reply::json(project).into_response(),
                    // the original contract: an empty body means "no such
                    // project", not an HTTP error
                    None => String::new().into_response(),
                }
            });

        let imagery_route = warp::path!("get-all-imagery")
            .and(warp::get())
            .and(warp::query::<ImageryQuery>())
            .and(store_filter.clone())
            .map(|query: ImageryQuery, store: Arc<RwLock<PlotStore>>| {
                let guard = store.read().unwrap();
                warp::reply::json(&guard.imagery_for(&query.institution_id))
            });

        let plot_route = warp::path!("get-unanalyzed-plot" / String)
            .and(warp::get())
            .and(store_filter.clone())
            .map(|_project_id: String, store: Arc<RwLock<PlotStore>>| {
                let guard = store.read().unwrap();
                match guard.next_unanalyzed() {
                    Some(plot) => warp::reply::json(&plot).into_response(),
                    None => "done".to_string().into_response(),
                }
            });

        let samples_route = warp::path!("add-user-samples")
            .and(warp::post())
            .and(warp::body::json())
            .and(store_filter.clone())
            .map(|submission: LabelSubmission, store: Arc<RwLock<PlotStore>>| {
                let mut guard = store.write().unwrap();
                if guard.record_labels(
                    &submission.plot_id,
                    &submission.user_id,
                    &submission.user_samples,
                ) {
                    StatusCode::OK.into_response()
                } else {
                    StatusCode::NOT_FOUND.into_response()
                }
            });

        let flag_route = warp::path!("flag-plot")
            .and(warp::post())
            .and(warp::body::json())
            .and(store_filter.clone())
            .map(|submission: FlagSubmission, store: Arc<RwLock<PlotStore>>| {
                let mut guard = store.write().unwrap();
                if guard.flag(&submission.plot_id) {
                    StatusCode::OK.into_response()
                } else {
                    StatusCode::NOT_FOUND.into_response()
                }
            });

        let stats_route = warp::path!("get-project-stats" / String)
            .and(warp::get())
            .and(store_filter)
            .map(|_project_id: String, store: Arc<RwLock<PlotStore>>| {
                let guard = store.read().unwrap();
                warp::reply::json(&guard.stats())
            });

        let routes = project_route
            .or(imagery_route)
            .or(plot_route)
            .or(samples_route)
            .or(flag_route)
            .or(stats_route);

        let (ready_tx, ready_rx) = mpsc::channel();
        thread::spawn(move || {
            let runtime = match Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    let _ = ready_tx.send(Err(format!("building service runtime: {err}")));
                    return;
                }
            };
            runtime.block_on(async move {
                let (addr, serving) = warp::serve(routes).bind_ephemeral(bind);
                let _ = ready_tx.send(Ok(addr));
                serving.await;
            });
        });

        let addr = ready_rx
            .recv()
            .context("stand-in service thread exited before binding")?
            .map_err(|message| anyhow::anyhow!(message))?;
        Ok(Self { addr })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}
