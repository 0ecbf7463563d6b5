//! Population-scaled town markers drawn above the region layer.
//!
//! Every `reload` clears the circle layer straight away and then fetches the
//! feed. Each invocation takes a generation number; when the fetch settles,
//! only the newest generation may draw, so a slow response from an earlier
//! reload cannot bring back markers that a later reload cleared.

use crate::canvas::RenderTarget;
use crate::config::MarkerStyle;
use crate::projection::Projection;
use crate::scale::RadiusScale;
use crate::source::Source;
use crate::types::{Location, Marker};
use anyhow::Result;
use serde::Serialize;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

pub trait LocationFeed: Send + Sync {
    fn fetch(&self) -> impl Future<Output = Result<Vec<Location>>> + Send;
}

/// Reads the town list from a URL or file.
pub struct SourceFeed {
    client: reqwest::Client,
    source: Source,
}

impl SourceFeed {
    pub fn new(client: reqwest::Client, location: &str) -> Self {
        Self {
            client,
            source: Source::parse(location),
        }
    }
}

impl LocationFeed for SourceFeed {
    async fn fetch(&self) -> Result<Vec<Location>> {
        self.source.fetch_json(&self.client).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayState {
    Empty,
    Loading,
    Rendered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ReloadOutcome {
    Rendered { markers: usize },
    Failed,
    /// A newer reload started before this one's fetch settled.
    Superseded,
}

#[derive(Debug)]
struct Status {
    generation: u64,
    state: OverlayState,
    markers: usize,
}

pub struct LocationOverlay<F, T: ?Sized> {
    feed: F,
    projection: Projection,
    style: MarkerStyle,
    target: Arc<Mutex<T>>,
    // Always locked before `target`.
    status: Mutex<Status>,
}

impl<F: LocationFeed, T: RenderTarget + ?Sized> LocationOverlay<F, T> {
    pub fn new(feed: F, projection: Projection, style: MarkerStyle, target: Arc<Mutex<T>>) -> Self {
        Self {
            feed,
            projection,
            style,
            target,
            status: Mutex::new(Status {
                generation: 0,
                state: OverlayState::Empty,
                markers: 0,
            }),
        }
    }

    pub fn state(&self) -> OverlayState {
        lock(&self.status).state
    }

    pub fn marker_count(&self) -> usize {
        lock(&self.status).markers
    }

    pub async fn reload(&self) -> ReloadOutcome {
        let generation = {
            let mut status = lock(&self.status);
            status.generation += 1;
            status.state = OverlayState::Loading;
            status.markers = 0;
            lock(&self.target).clear_circle_layer();
            status.generation
        };
        debug!(generation, "Fetching locations");

        let fetched = self.feed.fetch().await;

        let mut status = lock(&self.status);
        if status.generation != generation {
            debug!(generation, latest = status.generation, "Discarding superseded locations");
            return ReloadOutcome::Superseded;
        }

        match fetched {
            Ok(locations) => {
                let markers = self.build_markers(&locations);
                let count = markers.len();
                lock(&self.target).draw_circle_layer(markers);
                status.state = OverlayState::Rendered;
                status.markers = count;
                info!(generation, locations = locations.len(), markers = count, "Plotted locations");
                ReloadOutcome::Rendered { markers: count }
            }
            Err(e) => {
                error!(generation, "Error fetching locations: {:#}", e);
                status.state = OverlayState::Empty;
                ReloadOutcome::Failed
            }
        }
    }

    pub fn build_markers(&self, locations: &[Location]) -> Vec<Marker> {
        let scale = RadiusScale::for_locations(locations, self.style.min_radius, self.style.max_radius);
        locations
            .iter()
            .filter_map(|location| {
                let Some((cx, cy)) = self
                    .projection
                    .project_finite(location.longitude, location.latitude)
                else {
                    warn!(town = %location.name, "Location does not project onto the map");
                    return None;
                };
                Some(Marker {
                    cx,
                    cy,
                    r: scale.apply(location.population as f64),
                    fill: self.style.fill.clone(),
                    label: format!("{}\nPopulation: {}", location.name, location.population),
                })
            })
            .collect()
    }
}

fn lock<U: ?Sized>(mutex: &Mutex<U>) -> MutexGuard<'_, U> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
