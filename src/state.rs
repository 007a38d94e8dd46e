use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::controllers::recommender::Recommender;
use crate::hub::Hub;
use crate::models::track::{RecommendationContext, Track};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Last recommendation/radio track list, consulted by /track/{idx}.
    pub tracks: Arc<RwLock<Vec<Track>>>,
    /// Simple cache for recommendation results.
    pub cache: Arc<RwLock<HashMap<String, RecommendationContext>>>,
    pub hub: Arc<Hub>,
    pub recommender: Arc<Recommender>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            tracks: Arc::new(RwLock::new(Vec::new())),
            cache: Arc::new(RwLock::new(HashMap::new())),
            hub: Arc::new(Hub::new()),
            recommender: Arc::new(Recommender::new()),
        }
    }
}
