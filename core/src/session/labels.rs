use crate::backend::Plot;
use std::collections::BTreeMap;

/// Sample-to-label assignments for the current plot.
///
/// Reset on every plot change; keys are only ever drawn from the current
/// plot's sample ids.
#[derive(Debug, Clone, Default)]
pub struct LabelLedger {
    assigned: BTreeMap<String, String>,
}

impl LabelLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.assigned.clear();
    }

    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Records one assignment. Re-labeling a sample overwrites its previous
    /// label.
    pub fn record(&mut self, sample_id: &str, label_id: &str) {
        self.assigned
            .insert(sample_id.to_string(), label_id.to_string());
    }

    pub fn label_for(&self, sample_id: &str) -> Option<&str> {
        self.assigned.get(sample_id).map(String::as_str)
    }

    pub fn sample_ids(&self) -> impl Iterator<Item = &String> {
        self.assigned.keys()
    }

    /// True once every sample in the plot carries a label.
    pub fn covers(&self, plot: &Plot) -> bool {
        plot.samples
            .iter()
            .all(|sample| self.assigned.contains_key(&sample.id))
    }

    /// Copy of the mapping in the wire shape the backend expects.
    pub fn to_wire(&self) -> BTreeMap<String, String> {
        self.assigned.clone()
    }
}
