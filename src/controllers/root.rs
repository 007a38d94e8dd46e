use axum::response::{IntoResponse, Json};
use serde_json::json;

pub struct RootController;

impl RootController {
    pub async fn root() -> impl IntoResponse {
        Json(json!({
            "service": "dj-backend",
            "version": env!("CARGO_PKG_VERSION"),
        }))
    }

    pub async fn health_check() -> impl IntoResponse {
        Json(json!({"status": "ok"}))
    }

    /// Machine-readable route index served at /docs.
    pub async fn docs() -> impl IntoResponse {
        Json(json!({
            "routes": {
                "GET /": "service banner",
                "GET /health": "health check",
                "POST /recommendations": "search the catalog and return ranked tracks",
                "GET /lyrics": "relay a lyrics search to the RapidAPI upstream",
                "GET /track/{idx}": "select a track and fetch its lyrics as verses",
                "POST /radio": "start radio mode (audio + video playlists)",
                "GET /charts": "dynamic playlist from the recommender",
                "GET /ws/sync": "WebSocket hub for play/vol/control sync",
            }
        }))
    }
}
