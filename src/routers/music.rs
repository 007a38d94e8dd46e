// Catalog and playback routes
use axum::{
    Router,
    routing::{get, post},
};

use crate::controllers::music::{charts_route, radio_route, recommendations_route, track_route};
use crate::state::AppState;

pub fn music_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", post(recommendations_route))
        .route("/track/{idx}", get(track_route))
        .route("/radio", post(radio_route))
        .route("/charts", get(charts_route))
}
