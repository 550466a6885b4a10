use anyhow::Context;
use backend::{HttpBackend, LocalBackend};
use clap::Parser;
use plot_service::{PlotService, PlotStore};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use workflow::config::CollectorConfig;
use workflow::runner::SessionRunner;

mod backend;
mod plot_service;
mod scripted;
mod ui_bridge;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Land-cover collection workflow driver")]
struct Args {
    /// Load a collector config from YAML
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long, default_value = "1")]
    project_id: String,
    #[arg(long, default_value = "demo-analyst")]
    user_name: String,
    /// Base URL of the labeling backend
    #[arg(long)]
    backend_url: Option<String>,
    /// Host the in-memory stand-in plot service
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Run one scripted labeling session and exit
    #[arg(long, default_value_t = false)]
    scripted: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = if let Some(path) = args.config {
        CollectorConfig::load(path)?
    } else {
        CollectorConfig::from_args(args.project_id, args.user_name, args.backend_url)
    };

    let service = if args.serve {
        let store = Arc::new(RwLock::new(PlotStore::demo()));
        let service = PlotService::spawn(store, config.service_port)?;
        println!("Stand-in plot service at {}", service.base_url());
        if config.backend_url.is_none() {
            config.backend_url = Some(service.base_url());
        }
        Some(service)
    } else {
        None
    };

    if args.scripted {
        let runner = SessionRunner::new(config.clone());
        let summary = match &config.backend_url {
            Some(url) => runner.run(&HttpBackend::connect(url.clone())?)?,
            None => {
                let store = Arc::new(RwLock::new(PlotStore::demo()));
                runner.run(&LocalBackend::new(store))?
            }
        };
        println!(
            "Scripted run -> plots assigned {}, flagged {}, round trips {} ({} failed)",
            summary.plots_assigned, summary.plots_flagged, summary.round_trips, summary.failures
        );
    }

    if service.is_some() && !args.scripted {
        println!("Stand-in plot service running (Ctrl+C to stop)...");
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .context("creating runtime for signal handling")?;
        runtime.block_on(async {
            signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
            Ok::<(), anyhow::Error>(())
        })?;
    }

    Ok(())
}
