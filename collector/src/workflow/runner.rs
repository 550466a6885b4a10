use crate::scripted::plan::build_assignment_plan;
use crate::ui_bridge::{EditorBridge, MapBridge};
use crate::workflow::config::CollectorConfig;
use anyhow::Context;
use collectcore::backend::PlotFetch;
use collectcore::basemap::compose_base_map;
use collectcore::prelude::{MapSurface, PlotBackend, SessionError};
use collectcore::session::{PlotIntake, PlotRequest, SessionController, SubmitOutcome};
use collectcore::telemetry::MetricsRecorder;
use log::{info, warn};

const FETCH_ATTEMPTS: usize = 3;

/// Result of one scripted collection run.
pub struct RunSummary {
    pub plots_assigned: u64,
    pub plots_flagged: u64,
    pub round_trips: usize,
    pub failures: usize,
}

/// Drives a full collection session against any `PlotBackend`: load the
/// project, compose the base map, then fetch, label, and submit plots until
/// the backend runs dry or the configured cap is reached.
pub struct SessionRunner {
    config: CollectorConfig,
    metrics: MetricsRecorder,
}

impl SessionRunner {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn run(&self, backend: &dyn PlotBackend) -> anyhow::Result<RunSummary> {
        let project = match backend.project_by_id(&self.config.project_id) {
            Ok(project) => project,
            Err(SessionError::NotFound(message)) => {
                // hard stop, mirroring the original's redirect to home
                warn!("{message}; leaving the collection workflow");
                anyhow::bail!("no project found with id {}", self.config.project_id);
            }
            Err(err) => return Err(err).context("loading project info"),
        };
        self.metrics.record_round_trip();

        let catalog = backend
            .imagery_catalog(&project.institution)
            .context("loading the imagery catalog")?;
        self.metrics.record_round_trip();
        let map_init = compose_base_map(&project, &catalog).context("composing the base map")?;

        let mut map = MapBridge::new();
        let editor = EditorBridge::new();
        map.init_base_map(&map_init);
        map.set_imagery_source(&map_init.source);
        map.draw_boundary(&project.boundary);

        let mut controller = SessionController::new(project, self.config.user_name.clone());
        let mut request = controller.start()?;
        let mut handled = 0usize;

        loop {
            if self.config.max_plots.map_or(false, |cap| handled >= cap) {
                info!("plot cap {handled} reached, ending the run");
                break;
            }
            let fetch = self.fetch_with_retry(backend, &request)?;
            match controller.accept_plot(request.epoch, fetch, &mut map, &editor)? {
                PlotIntake::Exhausted => break,
                PlotIntake::Stale => {
                    request = controller.refetch()?;
                    continue;
                }
                PlotIntake::Ready => {}
            }
            handled += 1;
            request = self.resolve_plot(backend, &mut controller, &mut map)?;
        }

        let (round_trips, failures) = self.metrics.snapshot();
        Ok(RunSummary {
            plots_assigned: controller.plots_assigned(),
            plots_flagged: controller.plots_flagged(),
            round_trips,
            failures,
        })
    }

    /// Labels the current plot per the scripted plan and saves it, or flags
    /// it when there is nothing to label. Returns the next plot request.
    fn resolve_plot(
        &self,
        backend: &dyn PlotBackend,
        controller: &mut SessionController,
        map: &mut MapBridge,
    ) -> anyhow::Result<PlotRequest> {
        let (plot_id, plan) = {
            let plot = controller
                .current_plot()
                .context("controller has no plot after intake")?;
            (
                plot.id.clone(),
                build_assignment_plan(plot, &controller.project().sample_values),
            )
        };

        if plan.is_empty() {
            info!("plot {plot_id} has no labelable samples, flagging");
            return self.flag_with_retry(backend, controller);
        }

        for batch in &plan {
            map.select_samples(&batch.sample_ids);
            let selected = map.selected_samples();
            let progress = controller.assign_label(&selected, &batch.choice, map)?;
            info!(
                "labeled {} samples as {} on plot {plot_id} (complete: {})",
                progress.applied, batch.choice.id, progress.plot_complete
            );
        }
        if !controller.gates().save_enabled {
            anyhow::bail!("labeling plan left plot {plot_id} incomplete");
        }
        self.save_with_retry(backend, controller, map)
    }

    fn fetch_with_retry(
        &self,
        backend: &dyn PlotBackend,
        request: &PlotRequest,
    ) -> anyhow::Result<PlotFetch> {
        let mut attempt = 0;
        loop {
            match backend.next_unanalyzed_plot(&request.project_id) {
                Ok(fetch) => {
                    self.metrics.record_round_trip();
                    return Ok(fetch);
                }
                Err(err) => {
                    self.metrics.record_failure();
                    attempt += 1;
                    if attempt >= FETCH_ATTEMPTS {
                        return Err(err).context("fetching the next plot");
                    }
                    warn!("plot fetch failed ({err}), retrying");
                }
            }
        }
    }

    fn save_with_retry(
        &self,
        backend: &dyn PlotBackend,
        controller: &mut SessionController,
        map: &mut MapBridge,
    ) -> anyhow::Result<PlotRequest> {
        let mut last_attempt = false;
        loop {
            let staged = controller.begin_save()?;
            let outcome = backend.submit_labels(&staged.body);
            if outcome.is_ok() {
                self.metrics.record_round_trip();
            } else {
                self.metrics.record_failure();
            }
            match controller.complete_save(staged.epoch, outcome, map) {
                Ok(SubmitOutcome::Accepted { next }) => return Ok(next),
                Ok(SubmitOutcome::Stale) => anyhow::bail!("save response discarded as stale"),
                Err(err) => {
                    if last_attempt {
                        return Err(err).context("saving sample labels");
                    }
                    warn!("save failed ({err}), retrying once with the labels intact");
                    last_attempt = true;
                }
            }
        }
    }

    fn flag_with_retry(
        &self,
        backend: &dyn PlotBackend,
        controller: &mut SessionController,
    ) -> anyhow::Result<PlotRequest> {
        let mut last_attempt = false;
        loop {
            let staged = controller.begin_flag()?;
            let outcome = backend.flag_plot(&staged.body);
            if outcome.is_ok() {
                self.metrics.record_round_trip();
            } else {
                self.metrics.record_failure();
            }
            match controller.complete_flag(staged.epoch, outcome) {
                Ok(SubmitOutcome::Accepted { next }) => return Ok(next),
                Ok(SubmitOutcome::Stale) => anyhow::bail!("flag response discarded as stale"),
                Err(err) => {
                    if last_attempt {
                        return Err(err).context("flagging the plot");
                    }
                    warn!("flag failed ({err}), retrying once");
                    last_attempt = true;
                }
            }
        }
    }
}
