//! Session-state core for the land-cover collection platform.
//!
//! The modules re-express the browser-era collection workflow as a typed
//! state machine: plot and label records, a session controller that owns the
//! plot lifecycle, and trait seams for the REST backend, the map widget, and
//! the pop-up annotation surface.

pub mod backend;
pub mod basemap;
pub mod prelude;
pub mod session;
pub mod telemetry;

pub use prelude::{MapSurface, PlotBackend, PlotEditor};
