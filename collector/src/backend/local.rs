use crate::plot_service::store::PlotStore;
use collectcore::backend::{
    FlagSubmission, ImageryEntry, LabelSubmission, PlotFetch, Project,
};
use collectcore::prelude::{PlotBackend, SessionError, SessionResult};
use std::sync::{Arc, RwLock};

/// `PlotBackend` over the in-process store; used by runner tests and the
/// no-network demo path.
pub struct LocalBackend {
    store: Arc<RwLock<PlotStore>>,
}

impl LocalBackend {
    pub fn new(store: Arc<RwLock<PlotStore>>) -> Self {
        Self { store }
    }
}

impl PlotBackend for LocalBackend {
    fn project_by_id(&self, project_id: &str) -> SessionResult<Project> {
        let guard = self.store.read().unwrap();
        guard.project(project_id).cloned().ok_or_else(|| {
            SessionError::NotFound(format!("no project found with id {project_id}"))
        })
    }

    fn imagery_catalog(&self, institution_id: &str) -> SessionResult<Vec<ImageryEntry>> {
        let guard = self.store.read().unwrap();
        Ok(guard.imagery_for(institution_id))
    }

    fn next_unanalyzed_plot(&self, _project_id: &str) -> SessionResult<PlotFetch> {
        let guard = self.store.read().unwrap();
        Ok(match guard.next_unanalyzed() {
            Some(plot) => PlotFetch::Ready(plot),
            None => PlotFetch::Exhausted,
        })
    }

    fn submit_labels(&self, submission: &LabelSubmission) -> SessionResult<()> {
        let mut guard = self.store.write().unwrap();
        if guard.record_labels(
            &submission.plot_id,
            &submission.user_id,
            &submission.user_samples,
        ) {
            Ok(())
        } else {
            Err(SessionError::NotFound(format!(
                "no plot found with id {}",
                submission.plot_id
            )))
        }
    }

    fn flag_plot(&self, submission: &FlagSubmission) -> SessionResult<()> {
        let mut guard = self.store.write().unwrap();
        if guard.flag(&submission.plot_id) {
            Ok(())
        } else {
            Err(SessionError::NotFound(format!(
                "no plot found with id {}",
                submission.plot_id
            )))
        }
    }
}
