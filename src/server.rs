use crate::app::MapSession;
use crate::config::AppConfig;
use crate::index::RegionHit;
use crate::overlay::{LocationFeed, OverlayState, ReloadOutcome, SourceFeed};
use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>UK towns</title>
</head>
<body>
<button id="reloadButton">Reload</button>
<div id="map">{{SVG}}</div>
<script>
document.getElementById('reloadButton').addEventListener('click', async () => {
    try {
        await fetch('/api/reload', { method: 'POST' });
        const svg = await fetch('/map.svg');
        document.getElementById('map').innerHTML = await svg.text();
    } catch (error) {
        console.error('Error reloading locations:', error);
    }
});
</script>
</body>
</html>
"#;

pub type AppState<F> = Arc<MapSession<F>>;

#[derive(Deserialize)]
pub struct RegionQuery {
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
pub struct OverlayStatus {
    state: OverlayState,
    markers: usize,
}

pub fn router<F: LocationFeed + 'static>(state: AppState<F>) -> Router {
    Router::new()
        .route("/", get(index_handler::<F>))
        .route("/map.svg", get(svg_handler::<F>))
        .route("/api/reload", post(reload_handler::<F>))
        .route("/api/overlay", get(overlay_handler::<F>))
        .route("/api/region", get(region_handler::<F>))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let session = MapSession::<SourceFeed>::start(&config).await?;
    let app = router(Arc::new(session));

    let listener = bind_listener(&config.server.host, config.server.port).await?;
    info!("Starting server on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Binds `host:port`, resolving host names such as `localhost`.
pub async fn bind_listener(host: &str, port: u16) -> Result<TcpListener> {
    TcpListener::bind((host, port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", host, port))
}

async fn index_handler<F: LocationFeed>(State(state): State<AppState<F>>) -> Html<String> {
    Html(INDEX_HTML.replace("{{SVG}}", &state.svg()))
}

async fn svg_handler<F: LocationFeed>(State(state): State<AppState<F>>) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/svg+xml")], state.svg())
}

async fn reload_handler<F: LocationFeed>(State(state): State<AppState<F>>) -> Json<ReloadOutcome> {
    Json(state.overlay.reload().await)
}

async fn overlay_handler<F: LocationFeed>(State(state): State<AppState<F>>) -> Json<OverlayStatus> {
    Json(OverlayStatus {
        state: state.overlay.state(),
        markers: state.overlay.marker_count(),
    })
}

async fn region_handler<F: LocationFeed>(
    State(state): State<AppState<F>>,
    Query(params): Query<RegionQuery>,
) -> Json<Option<RegionHit>> {
    Json(state.regions.locate(params.lon, params.lat))
}
