use serde::{Deserialize, Serialize};

/// Longitude/latitude pair in EPSG:4326.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// One point within a plot awaiting a classification label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub id: String,
    pub point: GeoPoint,
}

impl Sample {
    pub fn new(id: impl Into<String>, point: GeoPoint) -> Self {
        Self {
            id: id.into(),
            point,
        }
    }
}

/// Survey plot containing the sample points to classify. Immutable once
/// fetched; label assignments live in the session ledger, never here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plot {
    pub id: String,
    pub center: GeoPoint,
    pub samples: Vec<Sample>,
}

impl Plot {
    pub fn contains_sample(&self, sample_id: &str) -> bool {
        self.samples.iter().any(|sample| sample.id == sample_id)
    }
}

/// Classification choice with its map display color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelChoice {
    pub id: String,
    pub color: String,
}

impl LabelChoice {
    pub fn new(id: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            color: color.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plot_knows_its_sample_ids() {
        let plot = Plot {
            id: "p1".into(),
            center: GeoPoint::new(105.2, 10.1),
            samples: vec![Sample::new("s1", GeoPoint::new(105.2, 10.1))],
        };
        assert!(plot.contains_sample("s1"));
        assert!(!plot.contains_sample("s2"));
    }
}
