use crate::backend::{
    FlagSubmission, GeoPoint, ImageryEntry, LabelSubmission, PlotFetch, Project, Sample,
};
use serde::{Deserialize, Serialize};

/// Display parameters handed to the map widget exactly once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapInit {
    pub source: String,
    pub attribution: String,
    pub boundary: String,
    pub wms_params: Option<WmsParams>,
}

/// Year/profile pair applied when the wide-swath WMS source is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WmsParams {
    pub imagery_year: i32,
    pub stacking_profile: String,
}

/// Rectangular view extent reported by the map widget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewExtent {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl ViewExtent {
    /// Bracketed form used in the annotation surface's query string.
    pub fn as_query(&self) -> String {
        format!(
            "[{},{},{},{}]",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

/// Request handed to the external annotation surface when a plot opens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotEditorRequest {
    pub title: String,
    pub project_id: String,
    pub extent: ViewExtent,
    pub center: GeoPoint,
    pub radius: f64,
}

/// Common error type for session operations.
#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("validation: {0}")]
    Validation(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// REST operations consumed by the session workflow. Every call is
/// fire-once; retrying is the caller's decision.
pub trait PlotBackend {
    fn project_by_id(&self, project_id: &str) -> SessionResult<Project>;
    fn imagery_catalog(&self, institution_id: &str) -> SessionResult<Vec<ImageryEntry>>;
    fn next_unanalyzed_plot(&self, project_id: &str) -> SessionResult<PlotFetch>;
    fn submit_labels(&self, submission: &LabelSubmission) -> SessionResult<()>;
    fn flag_plot(&self, submission: &FlagSubmission) -> SessionResult<()>;
}

/// Rendering surface owned by the map widget. The controller only ever
/// issues instructions through this seam; nothing writes back into session
/// state.
pub trait MapSurface {
    fn init_base_map(&mut self, params: &MapInit);
    fn set_imagery_source(&mut self, source: &str);
    fn draw_boundary(&mut self, boundary: &str);
    fn draw_sample_points(&mut self, samples: &[Sample]);
    fn clear_selection(&mut self);
    fn recolor_sample(&mut self, sample_id: &str, color: &str);
    fn view_extent(&self) -> ViewExtent;
    fn selected_samples(&self) -> Vec<String>;
}

/// One-way hook for the pop-up annotation window. No result is consumed.
pub trait PlotEditor {
    fn open_plot_editor(&self, request: &PlotEditorRequest);
}
