use collectcore::backend::{
    FlagSubmission, ImageryEntry, LabelSubmission, Plot, PlotFetch, Project,
};
use collectcore::prelude::{PlotBackend, SessionError, SessionResult};
use serde::Serialize;
use tokio::runtime::{Builder, Runtime};

/// REST client for the labeling backend.
///
/// Each call runs to completion on an owned current-thread runtime, so the
/// trait stays synchronous for the workflow; retrying is the caller's
/// decision.
pub struct HttpBackend {
    base: String,
    client: reqwest::Client,
    runtime: Runtime,
}

impl HttpBackend {
    pub fn connect(base: impl Into<String>) -> SessionResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| SessionError::Transport(format!("building client runtime: {err}")))?;
        Ok(Self {
            base: base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            runtime,
        })
    }

    fn get_text(&self, path: &str) -> SessionResult<String> {
        self.runtime.block_on(async {
            let response = self
                .client
                .get(format!("{}{}", self.base, path))
                .send()
                .await
                .map_err(|err| SessionError::Transport(err.to_string()))?;
            if !response.status().is_success() {
                return Err(SessionError::Transport(format!(
                    "{} returned {}",
                    path,
                    response.status()
                )));
            }
            response
                .text()
                .await
                .map_err(|err| SessionError::Transport(err.to_string()))
        })
    }

    fn post_ack<B: Serialize>(&self, path: &str, body: &B) -> SessionResult<()> {
        self.runtime.block_on(async {
            let response = self
                .client
                .post(format!("{}{}", self.base, path))
                .json(body)
                .send()
                .await
                .map_err(|err| SessionError::Transport(err.to_string()))?;
            if response.status().is_success() {
                Ok(())
            } else {
                Err(SessionError::Transport(format!(
                    "{} returned {}",
                    path,
                    response.status()
                )))
            }
        })
    }
}

impl PlotBackend for HttpBackend {
    fn project_by_id(&self, project_id: &str) -> SessionResult<Project> {
        let body = self.get_text(&format!("/get-project-by-id/{project_id}"))?;
        if body.is_empty() {
            return Err(SessionError::NotFound(format!(
                "no project found with id {project_id}"
            )));
        }
        serde_json::from_str(&body)
            .map_err(|err| SessionError::Transport(format!("decoding project: {err}")))
    }

    fn imagery_catalog(&self, institution_id: &str) -> SessionResult<Vec<ImageryEntry>> {
        let body = self.get_text(&format!("/get-all-imagery?institutionId={institution_id}"))?;
        serde_json::from_str(&body)
            .map_err(|err| SessionError::Transport(format!("decoding imagery list: {err}")))
    }

    fn next_unanalyzed_plot(&self, project_id: &str) -> SessionResult<PlotFetch> {
        let body = self.get_text(&format!("/get-unanalyzed-plot/{project_id}"))?;
        if body == "done" {
            return Ok(PlotFetch::Exhausted);
        }
        let plot: Plot = serde_json::from_str(&body)
            .map_err(|err| SessionError::Transport(format!("decoding plot: {err}")))?;
        Ok(PlotFetch::Ready(plot))
    }

    fn submit_labels(&self, submission: &LabelSubmission) -> SessionResult<()> {
        self.post_ack("/add-user-samples", submission)
    }

    fn flag_plot(&self, submission: &FlagSubmission) -> SessionResult<()> {
        self.post_ack("/flag-plot", submission)
    }
}
