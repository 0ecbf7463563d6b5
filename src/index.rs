use crate::region::feature_label;
use crate::types::BoundaryCollection;
use geo::{BoundingRect, Contains, MultiPolygon, Point};
use geojson::Value;
use rstar::{RTree, RTreeObject, AABB};
use serde::Serialize;

// Envelope entry pointing back into the region list.
struct RegionEnvelope {
    index: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for RegionEnvelope {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

struct IndexedRegion {
    index: usize,
    label: Option<String>,
    geometry: MultiPolygon<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionHit {
    pub index: usize,
    pub label: Option<String>,
}

/// Point-in-region lookup over the polygonal boundary features.
pub struct RegionIndex {
    regions: Vec<IndexedRegion>,
    tree: RTree<RegionEnvelope>,
}

impl RegionIndex {
    pub fn build(boundaries: &BoundaryCollection, label_property: &str) -> Self {
        let regions: Vec<IndexedRegion> = boundaries
            .features
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                let value = &feature.geometry.as_ref()?.value;
                Some(IndexedRegion {
                    index,
                    label: feature_label(feature, label_property),
                    geometry: to_multipolygon(value)?,
                })
            })
            .collect();

        let envelopes = regions
            .iter()
            .enumerate()
            .filter_map(|(slot, region)| {
                let rect = region.geometry.bounding_rect()?;
                Some(RegionEnvelope {
                    index: slot,
                    aabb: AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]),
                })
            })
            .collect();

        Self {
            regions,
            tree: RTree::bulk_load(envelopes),
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn locate(&self, longitude: f64, latitude: f64) -> Option<RegionHit> {
        let point = Point::new(longitude, latitude);
        let envelope = AABB::from_point([longitude, latitude]);
        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| self.regions.get(candidate.index))
            .filter(|region| region.geometry.contains(&point))
            .min_by_key(|region| region.index)
            .map(|region| RegionHit {
                index: region.index,
                label: region.label.clone(),
            })
    }
}

fn to_multipolygon(value: &Value) -> Option<MultiPolygon<f64>> {
    let polygons: Vec<&Vec<Vec<Vec<f64>>>> = match value {
        Value::Polygon(rings) => vec![rings],
        Value::MultiPolygon(polygons) => polygons.iter().collect(),
        _ => return None,
    };
    // geojson's conversion indexes positions directly, so check them first.
    let well_formed = polygons
        .iter()
        .flat_map(|rings| rings.iter().flatten())
        .all(|position| position.len() >= 2);
    if !well_formed {
        return None;
    }

    match geo::Geometry::<f64>::try_from(value.clone()).ok()? {
        geo::Geometry::MultiPolygon(mp) => Some(mp),
        geo::Geometry::Polygon(p) => Some(MultiPolygon::new(vec![p])),
        _ => None,
    }
}
