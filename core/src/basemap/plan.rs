use crate::backend::{ImageryEntry, Project};
use crate::prelude::{MapInit, SessionError, SessionResult, WmsParams};

/// Wide-swath commercial source whose attribution must carry the imagery
/// year and stacking profile.
pub const DIGITAL_GLOBE_WMS: &str = "DigitalGlobeWMSImagery";

/// Derives the map display parameters from a loaded project and its
/// institution's imagery catalog.
///
/// A project referencing an imagery source absent from the catalog is
/// upstream data corruption, not a renderable state, so this fails before
/// any map call is made. Runs exactly once per session, before the first
/// plot fetch.
pub fn compose_base_map(project: &Project, catalog: &[ImageryEntry]) -> SessionResult<MapInit> {
    let entry = catalog
        .iter()
        .find(|imagery| imagery.title == project.base_map_source)
        .ok_or_else(|| {
            SessionError::Configuration(format!(
                "imagery source {} missing from the institution catalog",
                project.base_map_source
            ))
        })?;

    let (attribution, wms_params) = if project.base_map_source == DIGITAL_GLOBE_WMS {
        (
            format!(
                "{} | {} ({})",
                entry.attribution, project.imagery_year, project.stacking_profile
            ),
            Some(WmsParams {
                imagery_year: project.imagery_year,
                stacking_profile: project.stacking_profile.clone(),
            }),
        )
    } else {
        (entry.attribution.clone(), None)
    };

    Ok(MapInit {
        source: project.base_map_source.clone(),
        attribution,
        boundary: project.boundary.clone(),
        wms_params,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(source: &str) -> Project {
        Project {
            id: "1".into(),
            name: "Test Project".into(),
            institution: "institution-1".into(),
            boundary: "{\"type\":\"Polygon\",\"coordinates\":[]}".into(),
            base_map_source: source.into(),
            imagery_year: 2016,
            stacking_profile: "Accuracy_Profile".into(),
            plot_size: 200.0,
            plot_shape: "circle".into(),
            sample_values: Vec::new(),
        }
    }

    #[test]
    fn missing_imagery_source_is_a_configuration_error() {
        let catalog = vec![ImageryEntry::new("Y", "Y attribution")];
        let result = compose_base_map(&project("X"), &catalog);
        assert!(matches!(result, Err(SessionError::Configuration(_))));
    }

    #[test]
    fn wide_swath_source_appends_year_and_profile() {
        let catalog = vec![ImageryEntry::new(DIGITAL_GLOBE_WMS, "DG imagery")];
        let init = compose_base_map(&project(DIGITAL_GLOBE_WMS), &catalog).unwrap();
        assert_eq!(init.attribution, "DG imagery | 2016 (Accuracy_Profile)");
        assert!(init.wms_params.is_some());
    }

    #[test]
    fn other_sources_keep_the_catalog_attribution_verbatim() {
        let catalog = vec![ImageryEntry::new("Open Aerial Map", "OAM contributors")];
        let init = compose_base_map(&project("Open Aerial Map"), &catalog).unwrap();
        assert_eq!(init.attribution, "OAM contributors");
        assert!(init.wms_params.is_none());
    }
}
