use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Runtime settings for one collection session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    pub project_id: String,
    pub user_name: String,
    /// Base URL of the labeling backend; `None` selects the in-process
    /// store.
    pub backend_url: Option<String>,
    /// Port for the stand-in plot service when hosting it. Port 0 binds an
    /// ephemeral port.
    pub service_port: u16,
    /// Upper bound on plots handled in one scripted run.
    pub max_plots: Option<usize>,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            project_id: "1".into(),
            user_name: "demo-analyst".into(),
            backend_url: None,
            service_port: 9000,
            max_plots: None,
        }
    }
}

impl CollectorConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading collector config {}", path_ref.display()))?;
        let config: CollectorConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing collector config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(project_id: String, user_name: String, backend_url: Option<String>) -> Self {
        Self {
            project_id,
            user_name,
            backend_url,
            ..Self::default()
        }
    }
}
