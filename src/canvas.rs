//! The mount point the map is drawn into.
//!
//! Regions and town markers live in two disjoint layers of one `g.map` group.
//! The region renderer only touches the path layer and the overlay only
//! touches the circle layer.

use crate::types::{Marker, RegionShape};
use serde::Serialize;
use std::fmt::Write;

/// Counts produced by binding a new set of shapes to a layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct JoinSummary {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
}

pub trait RenderTarget {
    /// Binds `shapes` to the path layer by position: new positions are
    /// appended, existing ones updated in place, surplus ones removed.
    fn draw_path_layer(&mut self, shapes: Vec<RegionShape>) -> JoinSummary;

    fn clear_circle_layer(&mut self);

    /// Appends `markers` to the circle layer.
    fn draw_circle_layer(&mut self, markers: Vec<Marker>);
}

#[derive(Debug, Clone, Default)]
pub struct SvgCanvas {
    width: u32,
    height: u32,
    paths: Vec<RegionShape>,
    circles: Vec<Marker>,
}

impl SvgCanvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    pub fn paths(&self) -> &[RegionShape] {
        &self.paths
    }

    pub fn circles(&self) -> &[Marker] {
        &self.circles
    }

    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" id="content" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );
        out.push_str("<g class=\"map\">\n");
        for shape in &self.paths {
            out.push_str("<path");
            if let Some(d) = &shape.d {
                let _ = write!(out, " d=\"{}\"", d);
            }
            let _ = write!(
                out,
                " style=\"fill: {}; opacity: {}; stroke: {};\"",
                escape(&shape.fill),
                shape.opacity,
                escape(&shape.stroke)
            );
            match &shape.label {
                Some(label) => {
                    let _ = writeln!(out, "><title>{}</title></path>", escape(label));
                }
                None => out.push_str("/>\n"),
            }
        }
        for marker in &self.circles {
            let _ = writeln!(
                out,
                "<circle class=\"location\" cx=\"{}\" cy=\"{}\" r=\"{}\" style=\"fill: {};\"><title>{}</title></circle>",
                marker.cx,
                marker.cy,
                marker.r,
                escape(&marker.fill),
                escape(&marker.label)
            );
        }
        out.push_str("</g>\n</svg>\n");
        out
    }
}

impl RenderTarget for SvgCanvas {
    fn draw_path_layer(&mut self, shapes: Vec<RegionShape>) -> JoinSummary {
        let existing = self.paths.len();
        let incoming = shapes.len();
        let summary = JoinSummary {
            entered: incoming.saturating_sub(existing),
            updated: incoming.min(existing),
            exited: existing.saturating_sub(incoming),
        };

        self.paths.truncate(incoming);
        for (slot, shape) in self.paths.iter_mut().zip(shapes.iter()) {
            *slot = shape.clone();
        }
        self.paths.extend(shapes.into_iter().skip(summary.updated));
        summary
    }

    fn clear_circle_layer(&mut self) {
        self.circles.clear();
    }

    fn draw_circle_layer(&mut self, markers: Vec<Marker>) {
        self.circles.extend(markers);
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
