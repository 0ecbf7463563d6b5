use crate::boundary;
use crate::canvas::SvgCanvas;
use crate::config::AppConfig;
use crate::index::RegionIndex;
use crate::overlay::{LocationFeed, LocationOverlay, SourceFeed};
use crate::projection::Projection;
use crate::region;
use crate::source::build_client;
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::info;

/// A drawn map: the base regions plus the reloadable town overlay.
pub struct MapSession<F> {
    pub canvas: Arc<Mutex<SvgCanvas>>,
    pub overlay: LocationOverlay<F, SvgCanvas>,
    pub regions: RegionIndex,
}

impl MapSession<SourceFeed> {
    pub async fn start(config: &AppConfig) -> Result<Self> {
        let client = build_client(config.sources.timeout_secs)?;
        let feed = SourceFeed::new(client.clone(), &config.sources.locations);
        Self::start_with_feed(config, &client, feed).await
    }
}

impl<F: LocationFeed> MapSession<F> {
    /// Loads the boundaries, draws the regions, then plots the towns once.
    ///
    /// A boundary failure is returned before anything is drawn; the feed is
    /// never queried in that case.
    pub async fn start_with_feed(config: &AppConfig, client: &reqwest::Client, feed: F) -> Result<Self> {
        let boundaries = boundary::load_boundaries(client, &config.sources.boundaries)
            .await
            .context("Failed to load map boundaries")?;

        let projection = Projection::from_config(&config.map);
        let mut canvas = SvgCanvas::new(config.map.width, config.map.height);
        region::draw_regions(&mut canvas, &boundaries, &projection, &config.regions);
        let regions = RegionIndex::build(&boundaries, &config.regions.label_property);

        let canvas = Arc::new(Mutex::new(canvas));
        let overlay = LocationOverlay::new(feed, projection, config.markers.clone(), canvas.clone());
        let outcome = overlay.reload().await;
        info!(?outcome, indexed_regions = regions.len(), "Map session started");

        Ok(Self {
            canvas,
            overlay,
            regions,
        })
    }

    pub fn svg(&self) -> String {
        self.canvas
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .to_svg()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{OverlayState, ReloadOutcome};
    use crate::types::Location;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingFeed {
        calls: Arc<AtomicUsize>,
        towns: Vec<Location>,
    }

    impl LocationFeed for CountingFeed {
        async fn fetch(&self) -> Result<Vec<Location>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.towns.clone())
        }
    }

    fn fixture(name: &str) -> String {
        format!("{}/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn offline_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.sources.boundaries = vec![fixture("uk.geojson"), fixture("isle-of-man.geojson")];
        config.sources.locations = fixture("towns.json");
        config
    }

    #[tokio::test]
    async fn draws_regions_then_towns() {
        let session = MapSession::start(&offline_config()).await.unwrap();

        assert_eq!(session.overlay.state(), OverlayState::Rendered);
        {
            let canvas = session.canvas.lock().unwrap();
            assert_eq!(canvas.paths().len(), 4);
            assert_eq!(canvas.circles().len(), 3);
        }

        let svg = session.svg();
        assert!(svg.contains("<title>Isle of Man</title>"));
        assert!(svg.contains("Douglas\nPopulation: 26218"));
        let last_path = svg.rfind("<path").unwrap();
        let first_circle = svg.find("<circle").unwrap();
        assert!(last_path < first_circle);
    }

    #[tokio::test]
    async fn boundary_failure_is_fatal_and_skips_the_overlay() {
        let mut config = offline_config();
        config.sources.boundaries[1] = fixture("missing.geojson");
        let calls = Arc::new(AtomicUsize::new(0));
        let feed = CountingFeed {
            calls: calls.clone(),
            towns: vec![],
        };

        let client = build_client(5).unwrap();
        let result = MapSession::start_with_feed(&config, &client, feed).await;

        let err = result.err().expect("boundary failure must abort startup");
        assert!(format!("{:#}", err).contains("Failed to load map boundaries"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn bad_boundary_geometry_does_not_stop_the_map() {
        let mut config = offline_config();
        config.sources.boundaries[0] = fixture("uk-bad-geometry.geojson");
        let session = MapSession::start(&config).await.unwrap();

        let canvas = session.canvas.lock().unwrap();
        let drawn: Vec<_> = canvas.paths().iter().map(|s| s.d.is_some()).collect();
        assert_eq!(drawn, [true, false, true]);
        assert_eq!(canvas.paths()[1].label.as_deref(), Some("Atlantis"));
        assert_eq!(canvas.circles().len(), 3);
    }

    #[tokio::test]
    async fn reload_only_touches_the_circle_layer() {
        let calls = Arc::new(AtomicUsize::new(0));
        let feed = CountingFeed {
            calls: calls.clone(),
            towns: vec![Location {
                name: "Leeds".to_string(),
                latitude: 53.8,
                longitude: -1.55,
                population: 536_280,
            }],
        };
        let client = build_client(5).unwrap();
        let session = MapSession::start_with_feed(&offline_config(), &client, feed)
            .await
            .unwrap();
        let paths_before = session.canvas.lock().unwrap().paths().to_vec();

        assert_eq!(session.overlay.reload().await, ReloadOutcome::Rendered { markers: 1 });
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        let canvas = session.canvas.lock().unwrap();
        assert_eq!(canvas.paths(), paths_before.as_slice());
        assert_eq!(canvas.circles().len(), 1);
    }
}
