use crate::backend::plot::Plot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of a next-plot fetch: one more plot to work, or the end of the
/// project.
#[derive(Debug, Clone)]
pub enum PlotFetch {
    Ready(Plot),
    Exhausted,
}

/// Body posted when saving a fully labeled plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSubmission {
    pub project_id: String,
    pub plot_id: String,
    pub user_id: String,
    /// Sample id to label id, one entry per sample in the plot.
    pub user_samples: BTreeMap<String, String>,
}

/// Body posted when flagging a plot as bad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagSubmission {
    pub project_id: String,
    pub plot_id: String,
}
