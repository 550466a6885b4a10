pub mod plot;
pub mod project;
pub mod submission;

pub use plot::{GeoPoint, LabelChoice, Plot, Sample};
pub use project::{ImageryEntry, Project};
pub use submission::{FlagSubmission, LabelSubmission, PlotFetch};
