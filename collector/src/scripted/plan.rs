use collectcore::backend::{LabelChoice, Plot};

/// One simulated user interaction: select a batch of samples, apply one
/// label.
#[derive(Debug, Clone)]
pub struct AssignmentBatch {
    pub sample_ids: Vec<String>,
    pub choice: LabelChoice,
}

/// Samples selected per simulated click batch.
const BATCH_SIZE: usize = 2;

/// Builds the deterministic labeling script for a plot: samples are taken
/// in small batches and the project's label catalog is cycled across them.
///
/// Returns no batches when the plot has no samples or the project offers no
/// labels; such plots can only be flagged.
pub fn build_assignment_plan(plot: &Plot, choices: &[LabelChoice]) -> Vec<AssignmentBatch> {
    if choices.is_empty() {
        return Vec::new();
    }
    plot.samples
        .chunks(BATCH_SIZE)
        .enumerate()
        .map(|(index, chunk)| AssignmentBatch {
            sample_ids: chunk.iter().map(|sample| sample.id.clone()).collect(),
            choice: choices[index % choices.len()].clone(),
        })
        .collect()
}
