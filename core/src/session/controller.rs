use crate::backend::{FlagSubmission, LabelChoice, LabelSubmission, Plot, PlotFetch, Project};
use crate::prelude::{MapSurface, PlotEditor, PlotEditorRequest, SessionError, SessionResult};
use crate::session::labels::LabelLedger;
use crate::session::phase::{ActionGates, SessionPhase, SubmitKind};
use crate::telemetry::LogManager;

/// Backend request for the next unanalyzed plot, tagged with the epoch of
/// the cycle that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlotRequest {
    pub project_id: String,
    pub epoch: u64,
}

/// Result of feeding a next-plot response back into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlotIntake {
    /// A plot is on screen and ready for labeling.
    Ready,
    /// The backend has no plots left; the session is finished.
    Exhausted,
    /// The response belonged to an abandoned cycle and was dropped.
    Stale,
}

/// Outcome of one label-assignment batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelProgress {
    pub applied: usize,
    pub rejected: usize,
    pub plot_complete: bool,
}

/// Save body plus the epoch that must still be current when the round-trip
/// completes.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedSave {
    pub epoch: u64,
    pub body: LabelSubmission,
}

/// Flag body plus its issuing epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedFlag {
    pub epoch: u64,
    pub body: FlagSubmission,
}

/// Outcome of completing a save or flag round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Accepted { next: PlotRequest },
    Stale,
}

/// Session controller owning the current plot, the label ledger, and the
/// completion counters.
///
/// All mutation flows through the event methods below. The map widget and
/// the annotation pop-up receive instructions through their seams but never
/// write back; network responses re-enter through the `complete_*` methods
/// carrying the epoch of the request that produced them, and responses from
/// an abandoned cycle are dropped without touching state.
pub struct SessionController {
    project: Project,
    user_name: String,
    phase: SessionPhase,
    epoch: u64,
    current_plot: Option<Plot>,
    ledger: LabelLedger,
    plots_assigned: u64,
    plots_flagged: u64,
    logger: LogManager,
}

impl SessionController {
    pub fn new(project: Project, user_name: impl Into<String>) -> Self {
        Self {
            project,
            user_name: user_name.into(),
            phase: SessionPhase::Idle,
            epoch: 0,
            current_plot: None,
            ledger: LabelLedger::new(),
            plots_assigned: 0,
            plots_flagged: 0,
            logger: LogManager::new(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn current_plot(&self) -> Option<&Plot> {
        self.current_plot.as_ref()
    }

    pub fn ledger(&self) -> &LabelLedger {
        &self.ledger
    }

    pub fn plots_assigned(&self) -> u64 {
        self.plots_assigned
    }

    pub fn plots_flagged(&self) -> u64 {
        self.plots_flagged
    }

    /// Declarative flag/save enablement for the current state.
    pub fn gates(&self) -> ActionGates {
        match self.phase {
            SessionPhase::PlotReady => ActionGates {
                flag_enabled: true,
                save_enabled: false,
            },
            SessionPhase::Labeling => ActionGates {
                flag_enabled: true,
                save_enabled: self
                    .current_plot
                    .as_ref()
                    .map(|plot| self.ledger.covers(plot))
                    .unwrap_or(false),
            },
            _ => ActionGates::default(),
        }
    }

    fn plot_request(&self) -> PlotRequest {
        PlotRequest {
            project_id: self.project.id.clone(),
            epoch: self.epoch,
        }
    }

    /// Idle -> AwaitingPlot, once the base map is up. Issues the first
    /// fetch.
    pub fn start(&mut self) -> SessionResult<PlotRequest> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::Validation("session already started".into()));
        }
        self.phase = SessionPhase::AwaitingPlot;
        self.logger.record("session started, awaiting first plot");
        Ok(self.plot_request())
    }

    /// Re-issues the outstanding fetch after a reported transport failure.
    pub fn refetch(&mut self) -> SessionResult<PlotRequest> {
        if self.phase != SessionPhase::AwaitingPlot {
            return Err(SessionError::Validation("no plot fetch to retry".into()));
        }
        Ok(self.plot_request())
    }

    /// Feeds a next-plot response into the session.
    ///
    /// On a fresh plot the ledger is reset, the sample points are drawn, and
    /// the annotation surface is opened with the plot geometry. A "done"
    /// marker ends the session for good.
    pub fn accept_plot(
        &mut self,
        epoch: u64,
        fetch: PlotFetch,
        map: &mut dyn MapSurface,
        editor: &dyn PlotEditor,
    ) -> SessionResult<PlotIntake> {
        if epoch != self.epoch {
            self.logger.record(&format!(
                "dropping stale plot response (epoch {} behind {})",
                epoch, self.epoch
            ));
            return Ok(PlotIntake::Stale);
        }
        if self.phase != SessionPhase::AwaitingPlot {
            return Err(SessionError::Validation("no plot fetch outstanding".into()));
        }
        match fetch {
            PlotFetch::Exhausted => {
                self.current_plot = None;
                self.ledger.clear();
                self.phase = SessionPhase::Done;
                self.logger.record("all plots have been analyzed for this project");
                Ok(PlotIntake::Exhausted)
            }
            PlotFetch::Ready(plot) => {
                self.ledger.clear();
                map.draw_sample_points(&plot.samples);
                editor.open_plot_editor(&PlotEditorRequest {
                    title: self.project.name.clone(),
                    project_id: self.project.id.clone(),
                    extent: map.view_extent(),
                    center: plot.center,
                    radius: self.project.plot_size / 2.0,
                });
                self.logger.record(&format!(
                    "plot {} ready with {} samples",
                    plot.id,
                    plot.samples.len()
                ));
                self.current_plot = Some(plot);
                self.phase = SessionPhase::PlotReady;
                Ok(PlotIntake::Ready)
            }
        }
    }

    /// Applies one label to every selected sample, then clears the map
    /// selection.
    ///
    /// Selections referencing samples outside the current plot are rejected
    /// entry by entry; the map widget is the only legitimate source of
    /// sample ids, but the ledger invariant holds even if that contract
    /// breaks. An empty selection is a user mistake, not a crash.
    pub fn assign_label(
        &mut self,
        selected: &[String],
        choice: &LabelChoice,
        map: &mut dyn MapSurface,
    ) -> SessionResult<LabelProgress> {
        let plot = match (self.phase, self.current_plot.as_ref()) {
            (SessionPhase::PlotReady | SessionPhase::Labeling, Some(plot)) => plot,
            _ => {
                return Err(SessionError::Validation(
                    "no plot is open for labeling".into(),
                ))
            }
        };
        if selected.is_empty() {
            return Err(SessionError::Validation(
                "no sample points selected".into(),
            ));
        }

        let mut applied = 0;
        let mut rejected = 0;
        for sample_id in selected {
            if plot.contains_sample(sample_id) {
                self.ledger.record(sample_id, &choice.id);
                map.recolor_sample(sample_id, &choice.color);
                applied += 1;
            } else {
                rejected += 1;
            }
        }
        map.clear_selection();
        if rejected > 0 {
            self.logger.warn(&format!(
                "rejected {} sample ids outside plot {}",
                rejected, plot.id
            ));
        }

        let plot_complete = self.ledger.covers(plot);
        if applied > 0 {
            self.phase = SessionPhase::Labeling;
        }
        Ok(LabelProgress {
            applied,
            rejected,
            plot_complete,
        })
    }

    /// Stages the save round-trip. Legal only once every sample in the
    /// current plot carries a label.
    pub fn begin_save(&mut self) -> SessionResult<StagedSave> {
        if !self.gates().save_enabled {
            return Err(SessionError::Validation(
                "save requires a label on every sample".into(),
            ));
        }
        let plot = self
            .current_plot
            .as_ref()
            .ok_or_else(|| SessionError::Validation("no plot is open".into()))?;
        let staged = StagedSave {
            epoch: self.epoch,
            body: LabelSubmission {
                project_id: self.project.id.clone(),
                plot_id: plot.id.clone(),
                user_id: self.user_name.clone(),
                user_samples: self.ledger.to_wire(),
            },
        };
        self.phase = SessionPhase::Submitting(SubmitKind::Save);
        Ok(staged)
    }

    /// Lands the save response. On success the plot advances; on failure the
    /// ledger and phase are restored so the identical save can be retried.
    pub fn complete_save(
        &mut self,
        epoch: u64,
        outcome: SessionResult<()>,
        map: &mut dyn MapSurface,
    ) -> SessionResult<SubmitOutcome> {
        if epoch != self.epoch {
            self.logger.record("dropping stale save response");
            return Ok(SubmitOutcome::Stale);
        }
        if self.phase != SessionPhase::Submitting(SubmitKind::Save) {
            return Err(SessionError::Validation("no save in flight".into()));
        }
        match outcome {
            Ok(()) => {
                self.plots_assigned += 1;
                map.clear_selection();
                self.logger.record(&format!(
                    "assignments saved ({} plots this session)",
                    self.plots_assigned
                ));
                Ok(SubmitOutcome::Accepted {
                    next: self.advance()?,
                })
            }
            Err(err) => {
                self.phase = self.resume_phase();
                Err(err)
            }
        }
    }

    /// Stages the flag round-trip for an unusable plot. Label completeness
    /// is irrelevant here.
    pub fn begin_flag(&mut self) -> SessionResult<StagedFlag> {
        if !self.gates().flag_enabled {
            return Err(SessionError::Validation("no plot is open to flag".into()));
        }
        let plot = self
            .current_plot
            .as_ref()
            .ok_or_else(|| SessionError::Validation("no plot is open".into()))?;
        let staged = StagedFlag {
            epoch: self.epoch,
            body: FlagSubmission {
                project_id: self.project.id.clone(),
                plot_id: plot.id.clone(),
            },
        };
        self.phase = SessionPhase::Submitting(SubmitKind::Flag);
        Ok(staged)
    }

    /// Lands the flag response. Success always advances, discarding any
    /// partial labels; failure restores the prior phase for a retry.
    pub fn complete_flag(
        &mut self,
        epoch: u64,
        outcome: SessionResult<()>,
    ) -> SessionResult<SubmitOutcome> {
        if epoch != self.epoch {
            self.logger.record("dropping stale flag response");
            return Ok(SubmitOutcome::Stale);
        }
        if self.phase != SessionPhase::Submitting(SubmitKind::Flag) {
            return Err(SessionError::Validation("no flag in flight".into()));
        }
        match outcome {
            Ok(()) => {
                self.plots_flagged += 1;
                self.logger.record(&format!(
                    "plot flagged ({} plots this session)",
                    self.plots_flagged
                ));
                Ok(SubmitOutcome::Accepted {
                    next: self.advance()?,
                })
            }
            Err(err) => {
                self.phase = self.resume_phase();
                Err(err)
            }
        }
    }

    /// Clears the current plot and label state and issues the next fetch.
    /// Also the recovery path for abandoning a plot outright; the epoch bump
    /// invalidates every response still in flight for the old plot.
    pub fn advance(&mut self) -> SessionResult<PlotRequest> {
        match self.phase {
            SessionPhase::Idle => {
                return Err(SessionError::Validation("session not started".into()))
            }
            SessionPhase::Done => {
                return Err(SessionError::Validation(
                    "no plots remain for this project".into(),
                ))
            }
            _ => {}
        }
        self.current_plot = None;
        self.ledger.clear();
        self.epoch += 1;
        self.phase = SessionPhase::AwaitingPlot;
        Ok(self.plot_request())
    }

    /// Phase to return to when a submission fails: the labeling phase the
    /// plot was in before the attempt.
    fn resume_phase(&self) -> SessionPhase {
        if self.ledger.is_empty() {
            SessionPhase::PlotReady
        } else {
            SessionPhase::Labeling
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{GeoPoint, Sample};
    use crate::prelude::{MapInit, ViewExtent};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingMap {
        drawn: Vec<String>,
        recolored: Vec<(String, String)>,
        selection_clears: usize,
    }

    impl MapSurface for RecordingMap {
        fn init_base_map(&mut self, _params: &MapInit) {}

        fn set_imagery_source(&mut self, _source: &str) {}

        fn draw_boundary(&mut self, _boundary: &str) {}

        fn draw_sample_points(&mut self, samples: &[Sample]) {
            self.drawn = samples.iter().map(|sample| sample.id.clone()).collect();
        }

        fn clear_selection(&mut self) {
            self.selection_clears += 1;
        }

        fn recolor_sample(&mut self, sample_id: &str, color: &str) {
            self.recolored.push((sample_id.into(), color.into()));
        }

        fn view_extent(&self) -> ViewExtent {
            ViewExtent {
                min_x: -1.0,
                min_y: -1.0,
                max_x: 1.0,
                max_y: 1.0,
            }
        }

        fn selected_samples(&self) -> Vec<String> {
            Vec::new()
        }
    }

    #[derive(Default)]
    struct RecordingEditor {
        opened: RefCell<Vec<PlotEditorRequest>>,
    }

    impl PlotEditor for RecordingEditor {
        fn open_plot_editor(&self, request: &PlotEditorRequest) {
            self.opened.borrow_mut().push(request.clone());
        }
    }

    fn project() -> Project {
        Project {
            id: "1".into(),
            name: "Mekong Delta Land Cover".into(),
            institution: "institution-1".into(),
            boundary: "{\"type\":\"Polygon\",\"coordinates\":[]}".into(),
            base_map_source: "Open Aerial Map".into(),
            imagery_year: 2016,
            stacking_profile: "Accuracy_Profile".into(),
            plot_size: 200.0,
            plot_shape: "circle".into(),
            sample_values: vec![
                LabelChoice::new("forest", "#11aa44"),
                LabelChoice::new("water", "#2244cc"),
            ],
        }
    }

    fn plot(id: &str, sample_ids: &[&str]) -> Plot {
        Plot {
            id: id.into(),
            center: GeoPoint::new(105.2, 10.1),
            samples: sample_ids
                .iter()
                .map(|sample_id| Sample::new(*sample_id, GeoPoint::new(105.2, 10.1)))
                .collect(),
        }
    }

    fn selection(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    fn ready_session(
        sample_ids: &[&str],
    ) -> (SessionController, RecordingMap, RecordingEditor) {
        let mut controller = SessionController::new(project(), "analyst");
        let mut map = RecordingMap::default();
        let editor = RecordingEditor::default();
        let request = controller.start().unwrap();
        let intake = controller
            .accept_plot(
                request.epoch,
                PlotFetch::Ready(plot("p1", sample_ids)),
                &mut map,
                &editor,
            )
            .unwrap();
        assert_eq!(intake, PlotIntake::Ready);
        (controller, map, editor)
    }

    #[test]
    fn save_gate_opens_only_when_every_sample_is_labeled() {
        let (mut controller, mut map, _editor) = ready_session(&["s1", "s2"]);
        assert_eq!(
            controller.gates(),
            ActionGates {
                flag_enabled: true,
                save_enabled: false
            }
        );

        let progress = controller
            .assign_label(&selection(&["s1"]), &LabelChoice::new("forest", "#11aa44"), &mut map)
            .unwrap();
        assert!(!progress.plot_complete);
        assert!(!controller.gates().save_enabled);

        let progress = controller
            .assign_label(&selection(&["s2"]), &LabelChoice::new("water", "#2244cc"), &mut map)
            .unwrap();
        assert!(progress.plot_complete);
        assert!(controller.gates().save_enabled);

        let staged = controller.begin_save().unwrap();
        assert_eq!(staged.body.user_samples.len(), 2);
        assert_eq!(staged.body.user_samples["s1"], "forest");
        // interlock: nothing is enabled while the save is in flight
        assert_eq!(controller.gates(), ActionGates::default());

        let outcome = controller
            .complete_save(staged.epoch, Ok(()), &mut map)
            .unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted { .. }));
        assert_eq!(controller.plots_assigned(), 1);
        assert!(controller.ledger().is_empty());
        assert_eq!(controller.phase(), SessionPhase::AwaitingPlot);
    }

    #[test]
    fn failed_save_preserves_labels_for_retry() {
        let (mut controller, mut map, _editor) = ready_session(&["s1", "s2"]);
        controller
            .assign_label(
                &selection(&["s1", "s2"]),
                &LabelChoice::new("forest", "#11aa44"),
                &mut map,
            )
            .unwrap();

        let staged = controller.begin_save().unwrap();
        let result = controller.complete_save(
            staged.epoch,
            Err(SessionError::Transport("connection reset".into())),
            &mut map,
        );
        assert!(matches!(result, Err(SessionError::Transport(_))));
        assert_eq!(controller.phase(), SessionPhase::Labeling);
        assert_eq!(controller.ledger().len(), 2);
        assert_eq!(controller.plots_assigned(), 0);

        let retry = controller.begin_save().unwrap();
        assert_eq!(retry.body, staged.body);
        controller
            .complete_save(retry.epoch, Ok(()), &mut map)
            .unwrap();
        assert_eq!(controller.plots_assigned(), 1);
    }

    #[test]
    fn flagging_clears_the_plot_regardless_of_completeness() {
        let (mut controller, mut map, _editor) = ready_session(&["s1", "s2"]);
        controller
            .assign_label(&selection(&["s1"]), &LabelChoice::new("forest", "#11aa44"), &mut map)
            .unwrap();

        let staged = controller.begin_flag().unwrap();
        let outcome = controller.complete_flag(staged.epoch, Ok(())).unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted { .. }));
        assert_eq!(controller.plots_flagged(), 1);
        assert_eq!(controller.plots_assigned(), 0);
        assert!(controller.current_plot().is_none());
        assert!(controller.ledger().is_empty());
    }

    #[test]
    fn failed_flag_restores_the_prior_phase() {
        let (mut controller, _map, _editor) = ready_session(&["s1"]);
        let staged = controller.begin_flag().unwrap();
        let result = controller.complete_flag(
            staged.epoch,
            Err(SessionError::Transport("gateway timeout".into())),
        );
        assert!(result.is_err());
        assert_eq!(controller.phase(), SessionPhase::PlotReady);
        assert_eq!(controller.plots_flagged(), 0);

        let retry = controller.begin_flag().unwrap();
        controller.complete_flag(retry.epoch, Ok(())).unwrap();
        assert_eq!(controller.plots_flagged(), 1);
    }

    #[test]
    fn advance_resets_labels_and_gates() {
        let (mut controller, mut map, _editor) = ready_session(&["s1", "s2"]);
        controller
            .assign_label(&selection(&["s1"]), &LabelChoice::new("forest", "#11aa44"), &mut map)
            .unwrap();

        let next = controller.advance().unwrap();
        assert_eq!(next.epoch, 1);
        assert!(controller.ledger().is_empty());
        assert!(controller.current_plot().is_none());
        assert_eq!(controller.gates(), ActionGates::default());
        assert_eq!(controller.phase(), SessionPhase::AwaitingPlot);
    }

    #[test]
    fn exhausted_backend_ends_the_session() {
        let mut controller = SessionController::new(project(), "analyst");
        let mut map = RecordingMap::default();
        let editor = RecordingEditor::default();
        let request = controller.start().unwrap();

        let intake = controller
            .accept_plot(request.epoch, PlotFetch::Exhausted, &mut map, &editor)
            .unwrap();
        assert_eq!(intake, PlotIntake::Exhausted);
        assert_eq!(controller.phase(), SessionPhase::Done);
        assert!(controller.current_plot().is_none());
        assert!(controller.advance().is_err());
        assert!(controller.refetch().is_err());
    }

    #[test]
    fn stale_plot_response_is_dropped() {
        let (mut controller, mut map, editor) = ready_session(&["s1"]);
        let old_epoch = controller.epoch();
        let next = controller.advance().unwrap();

        let intake = controller
            .accept_plot(
                old_epoch,
                PlotFetch::Ready(plot("p-late", &["z1"])),
                &mut map,
                &editor,
            )
            .unwrap();
        assert_eq!(intake, PlotIntake::Stale);
        assert!(controller.current_plot().is_none());
        assert_eq!(controller.phase(), SessionPhase::AwaitingPlot);

        let intake = controller
            .accept_plot(
                next.epoch,
                PlotFetch::Ready(plot("p2", &["s9"])),
                &mut map,
                &editor,
            )
            .unwrap();
        assert_eq!(intake, PlotIntake::Ready);
        assert_eq!(controller.current_plot().unwrap().id, "p2");
    }

    #[test]
    fn stale_save_response_is_dropped() {
        let (mut controller, mut map, _editor) = ready_session(&["s1"]);
        controller
            .assign_label(&selection(&["s1"]), &LabelChoice::new("forest", "#11aa44"), &mut map)
            .unwrap();
        let staged = controller.begin_save().unwrap();
        controller.advance().unwrap();

        let outcome = controller
            .complete_save(staged.epoch, Ok(()), &mut map)
            .unwrap();
        assert_eq!(outcome, SubmitOutcome::Stale);
        assert_eq!(controller.plots_assigned(), 0);
        assert_eq!(controller.phase(), SessionPhase::AwaitingPlot);
    }

    #[test]
    fn empty_selection_is_rejected_without_state_change() {
        let (mut controller, mut map, _editor) = ready_session(&["s1"]);
        let result = controller.assign_label(
            &[],
            &LabelChoice::new("forest", "#11aa44"),
            &mut map,
        );
        assert!(matches!(result, Err(SessionError::Validation(_))));
        assert!(controller.ledger().is_empty());
        assert_eq!(controller.phase(), SessionPhase::PlotReady);
    }

    #[test]
    fn foreign_sample_ids_are_rejected_per_entry() {
        let (mut controller, mut map, _editor) = ready_session(&["s1", "s2"]);
        let progress = controller
            .assign_label(
                &selection(&["s1", "intruder"]),
                &LabelChoice::new("forest", "#11aa44"),
                &mut map,
            )
            .unwrap();
        assert_eq!(progress.applied, 1);
        assert_eq!(progress.rejected, 1);

        let plot = controller.current_plot().unwrap();
        assert!(controller
            .ledger()
            .sample_ids()
            .all(|sample_id| plot.contains_sample(sample_id)));
        assert_eq!(map.recolored.len(), 1);
    }

    #[test]
    fn selection_is_cleared_after_every_batch() {
        let (mut controller, mut map, _editor) = ready_session(&["s1", "s2"]);
        controller
            .assign_label(&selection(&["s1"]), &LabelChoice::new("forest", "#11aa44"), &mut map)
            .unwrap();
        controller
            .assign_label(&selection(&["s2"]), &LabelChoice::new("water", "#2244cc"), &mut map)
            .unwrap();
        assert_eq!(map.selection_clears, 2);
    }

    #[test]
    fn editor_opens_with_the_plot_geometry() {
        let (_controller, map, editor) = ready_session(&["s1", "s2"]);
        assert_eq!(map.drawn, vec!["s1".to_string(), "s2".to_string()]);

        let opened = editor.opened.borrow();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].title, "Mekong Delta Land Cover");
        assert_eq!(opened[0].radius, 100.0);
        assert_eq!(opened[0].center, GeoPoint::new(105.2, 10.1));
    }

    #[test]
    fn save_is_refused_before_the_plot_is_complete() {
        let (mut controller, mut map, _editor) = ready_session(&["s1", "s2"]);
        controller
            .assign_label(&selection(&["s1"]), &LabelChoice::new("forest", "#11aa44"), &mut map)
            .unwrap();
        assert!(matches!(
            controller.begin_save(),
            Err(SessionError::Validation(_))
        ));
    }
}
