pub mod controller;
pub mod labels;
pub mod phase;

pub use controller::{
    LabelProgress, PlotIntake, PlotRequest, SessionController, StagedFlag, StagedSave,
    SubmitOutcome,
};
pub use labels::LabelLedger;
pub use phase::{ActionGates, SessionPhase, SubmitKind};
