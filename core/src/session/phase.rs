/// What a submitting session is waiting on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitKind {
    Save,
    Flag,
}

/// Lifecycle of the plot-sampling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    AwaitingPlot,
    PlotReady,
    Labeling,
    Submitting(SubmitKind),
    Done,
}

/// Declarative enablement of the flag and save actions. The rendering layer
/// reads this after every transition instead of being poked per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionGates {
    pub flag_enabled: bool,
    pub save_enabled: bool,
}
