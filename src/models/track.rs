use serde::{Deserialize, Serialize};

/// A processed catalog track as served to the frontend.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Track {
    pub title: String,
    pub artist: String,
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub music_url: String,
    pub thumbnail: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub labels: Vec<String>,
    pub weight: i32,
    #[serde(default)]
    pub index: usize,
}

impl Track {
    pub fn music_url_for(video_id: &str) -> String {
        format!("https://music.youtube.com/watch?v={}", video_id)
    }
}

/// The payload returned by /recommendations, also kept in the result cache.
#[derive(Serialize, Clone, Debug)]
pub struct RecommendationContext {
    pub query: String,
    pub tracks: Vec<Track>,
    pub song_tracks: Vec<Track>,
    pub video_tracks: Vec<Track>,
    #[serde(rename = "recLimit")]
    pub rec_limit: u32,
    #[serde(rename = "maxVol")]
    pub max_vol: u32,
    pub music_type: String,
}

/// What the player should play next, updated when a track is selected.
#[derive(Serialize, Clone, Debug)]
pub struct NextSong {
    pub title: Option<String>,
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
    pub timestamp: u32,
}

impl Default for NextSong {
    fn default() -> Self {
        NextSong {
            title: None,
            video_id: None,
            timestamp: 20,
        }
    }
}
