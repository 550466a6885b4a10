use crate::backend::plot::LabelChoice;
use serde::{Deserialize, Serialize};

/// Project record as served by the backend. Immutable once loaded; replaced
/// wholesale only by a re-fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub institution: String,
    /// GeoJSON polygon text delimiting the project area.
    pub boundary: String,
    pub base_map_source: String,
    pub imagery_year: i32,
    pub stacking_profile: String,
    /// Plot diameter in meters.
    pub plot_size: f64,
    pub plot_shape: String,
    /// Classification choices offered for this project's samples.
    pub sample_values: Vec<LabelChoice>,
}

/// One imagery source from an institution's catalog, keyed by title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageryEntry {
    pub title: String,
    pub attribution: String,
}

impl ImageryEntry {
    pub fn new(title: impl Into<String>, attribution: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            attribution: attribution.into(),
        }
    }
}
