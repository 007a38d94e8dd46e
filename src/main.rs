use axum::{Router, routing::get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

mod controllers;
mod hub;
mod models;
mod routers;
mod secrets;
mod state;

use crate::secrets::SECRET_MANAGER;
use routers::{docs_route, health_check_route, lyrics_routes, music_routes, root_route};
use state::AppState;

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_target(false)
        .init();

    let state = AppState::new();

    // Start building the catalog collections in the background
    {
        let recommender = state.recommender.clone();
        tokio::spawn(async move { recommender.build_all_collections().await });
    }

    let port = SECRET_MANAGER.get("PORT");
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .unwrap();

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app: Router = Router::new()
        // Core routes
        .route("/", get(root_route))
        .route("/health", get(health_check_route))
        .route("/docs", get(docs_route))
        // Catalog, playback and lyrics
        .merge(music_routes())
        .merge(lyrics_routes())
        // Sync hub
        .route("/ws/sync", get(hub::ws_sync_handler))
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("🎧 DJ backend listening on 0.0.0.0:{}", port);
    info!("📡 WebSocket endpoint: /ws/sync");

    axum::serve(listener, app).await.unwrap();
}
