use axum::{Router, routing::get};

use crate::controllers::lyrics::lyrics_route;
use crate::state::AppState;

pub fn lyrics_routes() -> Router<AppState> {
    Router::new().route("/lyrics", get(lyrics_route))
}
