use collectcore::backend::Sample;
use collectcore::prelude::{MapInit, MapSurface, ViewExtent};
use log::info;

/// Console stand-in for the map widget.
///
/// Tracks what the widget would hold on screen so scripted runs and tests
/// can drive sample selection through the same seam the controller uses.
pub struct MapBridge {
    drawn_samples: Vec<Sample>,
    selected: Vec<String>,
    extent: ViewExtent,
}

impl MapBridge {
    pub fn new() -> Self {
        Self {
            drawn_samples: Vec::new(),
            selected: Vec::new(),
            extent: ViewExtent {
                min_x: -180.0,
                min_y: -90.0,
                max_x: 180.0,
                max_y: 90.0,
            },
        }
    }

    /// Simulates the user click-selecting sample points. Only points that
    /// are actually on screen can be selected.
    pub fn select_samples(&mut self, sample_ids: &[String]) {
        self.selected = sample_ids
            .iter()
            .filter(|id| self.drawn_samples.iter().any(|sample| &sample.id == *id))
            .cloned()
            .collect();
    }

    #[cfg(test)]
    pub fn drawn_sample_ids(&self) -> Vec<String> {
        self.drawn_samples
            .iter()
            .map(|sample| sample.id.clone())
            .collect()
    }
}

impl Default for MapBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MapSurface for MapBridge {
    fn init_base_map(&mut self, params: &MapInit) {
        info!("[MAP] base map {} ({})", params.source, params.attribution);
        if let Some(wms) = &params.wms_params {
            info!(
                "[MAP] wms layer year {} profile {}",
                wms.imagery_year, wms.stacking_profile
            );
        }
    }

    fn set_imagery_source(&mut self, source: &str) {
        info!("[MAP] imagery source {}", source);
    }

    fn draw_boundary(&mut self, boundary: &str) {
        info!("[MAP] boundary polygon ({} bytes)", boundary.len());
    }

    fn draw_sample_points(&mut self, samples: &[Sample]) {
        info!("[MAP] drew {} sample points", samples.len());
        self.drawn_samples = samples.to_vec();
    }

    fn clear_selection(&mut self) {
        self.selected.clear();
    }

    fn recolor_sample(&mut self, sample_id: &str, color: &str) {
        info!("[MAP] sample {} -> {}", sample_id, color);
    }

    fn view_extent(&self) -> ViewExtent {
        self.extent
    }

    fn selected_samples(&self) -> Vec<String> {
        self.selected.clone()
    }
}
