use crate::canvas::{JoinSummary, RenderTarget};
use crate::config::RegionStyle;
use crate::projection::Projection;
use crate::types::{BoundaryCollection, RegionShape};
use anyhow::{anyhow, Result};
use geojson::{Feature, PointType, Value};
use rayon::prelude::*;
use std::fmt::Write;
use tracing::{info, warn};

const POINT_RADIUS: f64 = 4.5;

/// Projects every feature and binds the result to the path layer.
///
/// A feature that cannot be drawn still occupies its position, with no path
/// data, so the rest of the map renders.
pub fn draw_regions<T: RenderTarget + ?Sized>(
    target: &mut T,
    boundaries: &BoundaryCollection,
    projection: &Projection,
    style: &RegionStyle,
) -> JoinSummary {
    let shapes = build_shapes(boundaries, projection, style);
    let undrawn = shapes.iter().filter(|s| s.d.is_none()).count();
    let summary = target.draw_path_layer(shapes);
    info!(
        regions = boundaries.len(),
        undrawn,
        entered = summary.entered,
        updated = summary.updated,
        exited = summary.exited,
        "Drew region layer"
    );
    summary
}

pub fn build_shapes(
    boundaries: &BoundaryCollection,
    projection: &Projection,
    style: &RegionStyle,
) -> Vec<RegionShape> {
    boundaries
        .features
        .par_iter()
        .enumerate()
        .map(|(index, feature)| {
            let label = feature_label(feature, &style.label_property);
            let d = match feature_path(feature, projection) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!(index, label = label.as_deref().unwrap_or(""), "Skipping region geometry: {:#}", e);
                    None
                }
            };
            RegionShape {
                index,
                d,
                label,
                fill: style.fill.clone(),
                stroke: style.stroke.clone(),
                opacity: style.opacity,
            }
        })
        .collect()
}

pub fn feature_label(feature: &Feature, property: &str) -> Option<String> {
    match feature.property(property)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn feature_path(feature: &Feature, projection: &Projection) -> Result<String> {
    let geometry = feature
        .geometry
        .as_ref()
        .ok_or_else(|| anyhow!("feature has no geometry"))?;
    let mut d = String::new();
    PathWriter { projection, out: &mut d }.value(&geometry.value)?;
    Ok(d)
}

/// Writes SVG path data in the same shape d3's path generator does:
/// closed rings end with `Z` and drop their repeated closing position.
struct PathWriter<'a> {
    projection: &'a Projection,
    out: &'a mut String,
}

impl PathWriter<'_> {
    fn value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Point(p) => self.point(p),
            Value::MultiPoint(points) => points.iter().try_for_each(|p| self.point(p)),
            Value::LineString(line) => self.line(line, false),
            Value::MultiLineString(lines) => lines.iter().try_for_each(|l| self.line(l, false)),
            Value::Polygon(rings) => self.polygon(rings),
            Value::MultiPolygon(polygons) => polygons.iter().try_for_each(|p| self.polygon(p)),
            Value::GeometryCollection(geometries) => {
                geometries.iter().try_for_each(|g| self.value(&g.value))
            }
        }
    }

    fn project(&self, position: &PointType) -> Result<(f64, f64)> {
        match position.as_slice() {
            [lng, lat, ..] => self
                .projection
                .project_finite(*lng, *lat)
                .ok_or_else(|| anyhow!("position [{}, {}] does not project", lng, lat)),
            _ => Err(anyhow!("position has {} coordinates", position.len())),
        }
    }

    fn point(&mut self, position: &PointType) -> Result<()> {
        let (x, y) = self.project(position)?;
        let r = POINT_RADIUS;
        let _ = write!(
            self.out,
            "M{},{}m0,{}a{},{} 0 1,1 0,{}a{},{} 0 1,1 0,{}z",
            num(x),
            num(y),
            r,
            r,
            r,
            -2.0 * r,
            r,
            r,
            2.0 * r
        );
        Ok(())
    }

    fn line(&mut self, positions: &[PointType], closed: bool) -> Result<()> {
        let positions = if closed {
            &positions[..positions.len().saturating_sub(1)]
        } else {
            positions
        };
        for (i, position) in positions.iter().enumerate() {
            let (x, y) = self.project(position)?;
            let command = if i == 0 { 'M' } else { 'L' };
            let _ = write!(self.out, "{}{},{}", command, num(x), num(y));
        }
        if closed && !positions.is_empty() {
            self.out.push('Z');
        }
        Ok(())
    }

    fn polygon(&mut self, rings: &[Vec<PointType>]) -> Result<()> {
        rings.iter().try_for_each(|ring| self.line(ring, true))
    }
}

/// Three decimals, without trailing zeros.
fn num(v: f64) -> f64 {
    let rounded = (v * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
