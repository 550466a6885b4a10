use collectcore::backend::{GeoPoint, ImageryEntry, LabelChoice, Plot, Project, Sample};
use collectcore::basemap::DIGITAL_GLOBE_WMS;
use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

/// Plot record with the per-plot bookkeeping the backend maintains.
#[derive(Debug, Clone)]
pub struct StoredPlot {
    pub plot: Plot,
    pub flagged: bool,
    pub analyses: u32,
    pub user: Option<String>,
    pub values: BTreeMap<String, String>,
}

impl StoredPlot {
    fn new(plot: Plot) -> Self {
        Self {
            plot,
            flagged: false,
            analyses: 0,
            user: None,
            values: BTreeMap::new(),
        }
    }
}

/// Aggregate labeling progress for a project.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub flagged_plots: usize,
    pub analyzed_plots: usize,
    pub unanalyzed_plots: usize,
}

/// In-memory stand-in for the labeling backend's plot tables.
pub struct PlotStore {
    project: Project,
    imagery: Vec<ImageryEntry>,
    plots: Vec<StoredPlot>,
}

impl PlotStore {
    pub fn new(project: Project, imagery: Vec<ImageryEntry>, plots: Vec<Plot>) -> Self {
        Self {
            project,
            imagery,
            plots: plots.into_iter().map(StoredPlot::new).collect(),
        }
    }

    pub fn project(&self, project_id: &str) -> Option<&Project> {
        (self.project.id == project_id).then_some(&self.project)
    }

    /// Catalog for one institution; empty for anyone else.
    pub fn imagery_for(&self, institution_id: &str) -> Vec<ImageryEntry> {
        if self.project.institution == institution_id {
            self.imagery.clone()
        } else {
            Vec::new()
        }
    }

    /// Serves a random plot that is neither flagged nor analyzed, mirroring
    /// the original backend's pick.
    pub fn next_unanalyzed(&self) -> Option<Plot> {
        let open: Vec<&StoredPlot> = self
            .plots
            .iter()
            .filter(|stored| !stored.flagged && stored.analyses == 0)
            .collect();
        if open.is_empty() {
            None
        } else {
            let index = rand::thread_rng().gen_range(0..open.len());
            Some(open[index].plot.clone())
        }
    }

    /// Records a completed labeling pass for a plot. Returns false when the
    /// plot id is unknown.
    pub fn record_labels(
        &mut self,
        plot_id: &str,
        user: &str,
        values: &BTreeMap<String, String>,
    ) -> bool {
        match self.plots.iter_mut().find(|stored| stored.plot.id == plot_id) {
            Some(stored) => {
                stored.analyses += 1;
                stored.user = Some(user.to_string());
                stored.values = values.clone();
                true
            }
            None => false,
        }
    }

    /// Marks a plot as bad. Returns false when the plot id is unknown.
    pub fn flag(&mut self, plot_id: &str) -> bool {
        match self.plots.iter_mut().find(|stored| stored.plot.id == plot_id) {
            Some(stored) => {
                stored.flagged = true;
                true
            }
            None => false,
        }
    }

    pub fn stats(&self) -> ProjectStats {
        let flagged_plots = self.plots.iter().filter(|stored| stored.flagged).count();
        let analyzed_plots = self
            .plots
            .iter()
            .filter(|stored| stored.analyses > 0)
            .count();
        ProjectStats {
            flagged_plots,
            analyzed_plots,
            unanalyzed_plots: self
                .plots
                .len()
                .saturating_sub(flagged_plots + analyzed_plots),
        }
    }

    /// Seed data for demos and integration tests: one project, its imagery
    /// catalog, and three plots. The plot without samples exercises the
    /// flag path.
    pub fn demo() -> Self {
        let project = Project {
            id: "1".into(),
            name: "Mekong Delta Land Cover".into(),
            institution: "institution-1".into(),
            boundary: "{\"type\":\"Polygon\",\"coordinates\":[[[104.5,9.5],[106.5,9.5],[106.5,11.0],[104.5,11.0],[104.5,9.5]]]}".into(),
            base_map_source: DIGITAL_GLOBE_WMS.into(),
            imagery_year: 2016,
            stacking_profile: "Accuracy_Profile".into(),
            plot_size: 200.0,
            plot_shape: "circle".into(),
            sample_values: vec![
                LabelChoice::new("forest", "#11aa44"),
                LabelChoice::new("water", "#2244cc"),
                LabelChoice::new("urban", "#cc8822"),
            ],
        };
        let imagery = vec![
            ImageryEntry::new(DIGITAL_GLOBE_WMS, "DigitalGlobe Maps API"),
            ImageryEntry::new("Open Aerial Map", "OAM contributors"),
        ];
        let plots = vec![
            demo_plot("p1", 105.10, 10.20, 4),
            demo_plot("p2", 105.40, 10.45, 3),
            demo_plot("p3", 105.70, 10.70, 0),
        ];
        Self::new(project, imagery, plots)
    }
}

fn demo_plot(id: &str, lon: f64, lat: f64, sample_count: usize) -> Plot {
    Plot {
        id: id.into(),
        center: GeoPoint::new(lon, lat),
        samples: (0..sample_count)
            .map(|index| {
                Sample::new(
                    format!("{id}-s{index}"),
                    GeoPoint::new(lon + 0.0005 * index as f64, lat),
                )
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_unanalyzed_skips_flagged_and_analyzed_plots() {
        let mut store = PlotStore::demo();
        store.flag("p1");
        assert!(store.record_labels("p2", "tester", &BTreeMap::new()));

        let remaining = store.next_unanalyzed().unwrap();
        assert_eq!(remaining.id, "p3");

        store.flag("p3");
        assert!(store.next_unanalyzed().is_none());
    }

    #[test]
    fn record_labels_marks_the_plot_analyzed() {
        let mut store = PlotStore::demo();
        let values = BTreeMap::from([("p1-s0".to_string(), "forest".to_string())]);
        assert!(store.record_labels("p1", "tester", &values));
        assert!(!store.record_labels("missing", "tester", &values));

        let stats = store.stats();
        assert_eq!(stats.analyzed_plots, 1);
        assert_eq!(stats.unanalyzed_plots, 2);
    }

    #[test]
    fn imagery_is_scoped_to_the_institution() {
        let store = PlotStore::demo();
        assert_eq!(store.imagery_for("institution-1").len(), 2);
        assert!(store.imagery_for("someone-else").is_empty());
    }
}
