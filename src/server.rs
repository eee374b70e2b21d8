//! Page host: serves the rendered page and the raw track list.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use log::{error, info};
use tokio::sync::Mutex;

use crate::clients::errors::Result;
use crate::clients::{TrackSource, TrackStore, source_for};
use crate::config::{Config, PAGE_TITLE};
use crate::render::{Document, RecentTracksRenderer};

/// Shared state of the page host.
#[derive(Clone)]
pub struct AppState {
    /// Where `GET /` reads the track list from
    pub source: Arc<dyn TrackSource>,
    /// File served as `/recent_tracks.json`
    pub store: Arc<TrackStore>,
    /// Id of the container in the generated page
    pub container_id: String,
}

impl AppState {
    /// State for the configured source, tracks file and container id.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(AppState {
            source: source_for(&config.source, config.timeout)?,
            store: Arc::new(TrackStore::new(&config.tracks_file)),
            container_id: config.container_id.clone(),
        })
    }
}

/// Routes: `/`, `/recent_tracks.json` and `/health`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(recent_tracks_page))
        .route("/recent_tracks.json", get(recent_tracks_json))
        .route("/health", get(health_check))
        .with_state(state)
}

/// Bind `config.bind` and serve until the process stops.
pub async fn serve(config: &Config) -> Result<()> {
    let state = AppState::from_config(config)?;
    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    info!("Serving recent tracks on http://{}", config.bind);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// Every request gets its own page, so concurrent requests never share a container
async fn recent_tracks_page(State(state): State<AppState>) -> Html<String> {
    let document = Arc::new(Mutex::new(Document::page(PAGE_TITLE, &state.container_id)));
    let renderer = RecentTracksRenderer::new(state.source.clone(), document.clone(), &state.container_id);
    renderer.load_recent_songs().await;

    let html = document.lock().await.to_html();
    Html(html)
}

async fn recent_tracks_json(State(state): State<AppState>) -> Response {
    match state.store.load().await {
        Ok(Some(tracks)) => Json(tracks).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            error!("Failed to read tracks file: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const ONE_TRACK: &str = r#"[{"name":"Song A","artists":"Artist X","album_image":"http://x/img.png","link":"http://x/a"}]"#;

    fn state_for(dir: &tempfile::TempDir) -> AppState {
        let path = dir.path().join("recent_tracks.json");
        AppState {
            source: Arc::new(crate::clients::FileSource::new(&path)),
            store: Arc::new(TrackStore::new(&path)),
            container_id: "recent-tracks".into(),
        }
    }

    async fn get_body(state: AppState, uri: &str) -> (StatusCode, String) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn page_contains_rendered_tracks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("recent_tracks.json"), ONE_TRACK).unwrap();

        let (status, body) = get_body(state_for(&dir), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<h3 data-link=\"http://x/a\">Song A</h3>"));
        assert!(body.contains("<p>Artist X</p>"));
    }

    #[tokio::test]
    async fn page_is_served_empty_when_tracks_are_missing() {
        let dir = tempfile::tempdir().unwrap();

        let (status, body) = get_body(state_for(&dir), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<div id=\"recent-tracks\"></div>"));
    }

    #[tokio::test]
    async fn json_route_serves_stored_tracks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("recent_tracks.json"), ONE_TRACK).unwrap();

        let (status, body) = get_body(state_for(&dir), "/recent_tracks.json").await;
        assert_eq!(status, StatusCode::OK);
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value[0]["name"], "Song A");
    }

    #[tokio::test]
    async fn json_route_status_codes() {
        let dir = tempfile::tempdir().unwrap();
        let (status, _) = get_body(state_for(&dir), "/recent_tracks.json").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        std::fs::write(dir.path().join("recent_tracks.json"), "{broken").unwrap();
        let (status, _) = get_body(state_for(&dir), "/recent_tracks.json").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get_body(state_for(&dir), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"ok"}"#);
    }

    #[tokio::test]
    async fn taken_address_is_an_io_error() {
        let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let dir = tempfile::tempdir().unwrap();
        let config = crate::config::ConfigBuilder::new()
            .bind(Some(taken.local_addr().unwrap().to_string()))
            .source(Some(dir.path().join("recent_tracks.json").display().to_string()))
            .build_with(|_| None)
            .unwrap();

        assert!(matches!(serve(&config).await, Err(crate::clients::errors::Error::Io(_))));
    }
}
