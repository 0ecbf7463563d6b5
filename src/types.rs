use geojson::Feature;
use serde::{Deserialize, Serialize};

/// A town from the locations feed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Location {
    #[serde(rename = "Town")]
    pub name: String,
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    #[serde(rename = "Population")]
    pub population: u64,
}

/// Boundary features from every source, in load order.
#[derive(Debug, Clone, Default)]
pub struct BoundaryCollection {
    pub features: Vec<Feature>,
}

impl BoundaryCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// One projected region ready for the path layer. `d` is `None` when the
/// feature's geometry could not be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionShape {
    pub index: usize,
    pub d: Option<String>,
    pub label: Option<String>,
    pub fill: String,
    pub stroke: String,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub cx: f64,
    pub cy: f64,
    pub r: f64,
    pub fill: String,
    pub label: String,
}
