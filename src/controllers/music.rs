// Music catalog upstream and recommendation handlers
use std::collections::HashSet;
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::controllers::lyrics::LYRICS_CONTROLLER;
use crate::controllers::parser::{VERSE_GAP_THRESHOLD, detect_verses};
use crate::models::track::{RecommendationContext, Track};
use crate::secrets::SECRET_MANAGER;
use crate::state::AppState;

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// Client for the catalog upstream (search, related tracks, song metadata).
pub struct MusicApiController {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MusicApiController {
    pub fn new() -> Self {
        Self::with_base_url(
            SECRET_MANAGER.get("MUSIC_API_URL"),
            SECRET_MANAGER.get("MUSIC_API_KEY"),
        )
    }

    pub fn with_base_url(base_url: String, api_key: String) -> Self {
        MusicApiController {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> anyhow::Result<Value> {
        let mut request = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(params)
            .timeout(UPSTREAM_TIMEOUT);
        if !self.api_key.is_empty() {
            request = request.header("x-api-key", &self.api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("catalog upstream returned {}", status));
        }
        Ok(response.json().await?)
    }

    /// Search the catalog. `filter` is "songs" or "videos".
    pub async fn search(
        &self,
        query: &str,
        filter: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<Value>> {
        let data = self
            .get_json(
                "/search",
                &[
                    ("q", query.to_string()),
                    ("filter", filter.to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;
        Ok(unwrap_list(data, "results"))
    }

    /// Related tracks anchored on a video id (the "watch playlist").
    pub async fn watch_playlist(
        &self,
        video_id: &str,
        limit: u32,
        radio: bool,
    ) -> anyhow::Result<Vec<Value>> {
        let data = self
            .get_json(
                "/next",
                &[
                    ("videoId", video_id.to_string()),
                    ("limit", limit.to_string()),
                    ("radio", radio.to_string()),
                ],
            )
            .await?;
        Ok(unwrap_list(data, "tracks"))
    }

    /// Metadata for a single video id.
    pub async fn get_song(&self, video_id: &str) -> anyhow::Result<Value> {
        self.get_json("/song", &[("videoId", video_id.to_string())])
            .await
    }
}

pub static MUSIC_CONTROLLER: Lazy<MusicApiController> = Lazy::new(|| MusicApiController::new());

/// Accept either a bare JSON array or an object wrapping one under `key`.
fn unwrap_list(data: Value, key: &str) -> Vec<Value> {
    match data {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove(key) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    }
}

/// Content labels detected from a track title.
pub fn detect_labels(title: &str) -> Vec<String> {
    let t = title.to_lowercase();
    let mut labels: Vec<String> = Vec::new();

    if ["official video", "official music video", "official audio"]
        .iter()
        .any(|x| t.contains(x))
    {
        labels.push("Official".to_string());
    }
    if ["remix", "re-mix", "rmx"].iter().any(|x| t.contains(x)) {
        labels.push("Remix".to_string());
    }
    if t.contains("slowed") {
        labels.push("Slowed".to_string());
    }
    if t.contains("live") && !t.contains("deliver") {
        labels.push("Live".to_string());
    }
    if t.contains("lyrical") || t.contains("lyrics") {
        labels.push("Lyrics".to_string());
    }
    if t.contains("cover") {
        labels.push("Cover".to_string());
    }
    if t.contains("mashup") {
        labels.push("Mashup".to_string());
    }

    labels
}

/// Pick the largest available thumbnail and upscale known CDN URLs.
pub fn pick_thumbnail(raw: &Value, video_id: &str) -> String {
    let thumbnails = raw
        .get("thumbnails")
        .or_else(|| raw.get("thumbnail"))
        .cloned()
        .unwrap_or(Value::Null);

    // Some upstream shapes nest the list one level deeper
    let thumbnails = match &thumbnails {
        Value::Array(items) if items.first().map(|v| v.is_array()).unwrap_or(false) => {
            items[0].clone()
        }
        _ => thumbnails,
    };

    let mut url = match &thumbnails {
        Value::Array(items) => items
            .iter()
            .max_by_key(|t| {
                let w = t.get("width").and_then(|v| v.as_i64()).unwrap_or(0);
                let h = t.get("height").and_then(|v| v.as_i64()).unwrap_or(0);
                w * h
            })
            .and_then(|t| t.get("url"))
            .and_then(|u| u.as_str())
            .unwrap_or("")
            .to_string(),
        Value::Object(map) => map
            .get("url")
            .and_then(|u| u.as_str())
            .unwrap_or("")
            .to_string(),
        _ => String::new(),
    };

    if url.contains("googleusercontent.com") {
        if url.contains('=') {
            let base = url.split('=').next().unwrap_or("").to_string();
            url = format!("{}=w512-h512-l90-rj", base);
        } else if url.contains("-s") {
            let base = url.split("-s").next().unwrap_or("").to_string();
            url = format!("{}-s512-c", base);
        }
    }

    if url.is_empty() && !video_id.is_empty() {
        url = format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id);
    }

    url
}

/// Process raw upstream tracks into ranked frontend tracks.
/// Tracks missing a title or video id are dropped, as are titles matching
/// `filter_title` (lowercased). Output is sorted by weight descending.
pub fn process_results(results: &[Value], kind: &str, filter_title: Option<&str>) -> Vec<Track> {
    let mut processed: Vec<Track> = Vec::new();

    for raw in results {
        let title = raw.get("title").and_then(|t| t.as_str()).unwrap_or("");
        if title.is_empty() {
            continue;
        }
        if let Some(filter) = filter_title {
            if title.to_lowercase() == filter {
                continue;
            }
        }

        let video_id = raw.get("videoId").and_then(|v| v.as_str()).unwrap_or("");
        if video_id.is_empty() {
            continue;
        }

        let artist = raw
            .get("artists")
            .and_then(|a| a.get(0))
            .and_then(|a| a.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("")
            .to_string();

        let labels = detect_labels(title);
        let mut weight = 0;
        if labels.iter().any(|l| l == "Official") {
            weight += 10;
        }
        if kind == "song"
            && raw.get("type").and_then(|t| t.as_str()) == Some("MUSIC_VIDEO_TYPE_OFFICIAL_RELEASE")
        {
            weight += 5;
        }

        processed.push(Track {
            title: title.to_string(),
            artist,
            video_id: video_id.to_string(),
            music_url: Track::music_url_for(video_id),
            thumbnail: pick_thumbnail(raw, video_id),
            kind: kind.to_string(),
            labels,
            weight,
            index: 0,
        });
    }

    processed.sort_by(|a, b| b.weight.cmp(&a.weight));
    processed
}

/// Radio playlists use a lighter processing pass with a fixed label.
pub fn process_playlist_tracks(results: &[Value], label: &str) -> Vec<Track> {
    let mut processed = Vec::new();
    for raw in results {
        let title = raw
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .to_string();
        let video_id = raw.get("videoId").and_then(|v| v.as_str()).unwrap_or("");
        if video_id.is_empty() {
            continue;
        }
        let artist = raw
            .get("artists")
            .and_then(|a| a.get(0))
            .and_then(|a| a.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("")
            .to_string();

        processed.push(Track {
            title,
            artist,
            video_id: video_id.to_string(),
            music_url: Track::music_url_for(video_id),
            thumbnail: pick_thumbnail(raw, video_id),
            kind: "radio".to_string(),
            labels: vec![label.to_string()],
            weight: 5,
            index: 0,
        });
    }
    processed
}

/// Extend `bucket` with related tracks, deduplicating by video id and never
/// re-adding the anchor track, until `limit` tracks are present.
pub fn merge_related(bucket: &mut Vec<Track>, related: Vec<Track>, anchor: Option<&str>, limit: usize) {
    let mut seen: HashSet<String> = bucket.iter().map(|t| t.video_id.clone()).collect();
    if let Some(anchor) = anchor {
        seen.insert(anchor.to_string());
    }
    for track in related {
        if bucket.len() >= limit {
            break;
        }
        if seen.insert(track.video_id.clone()) {
            bucket.push(track);
        }
    }
}

/// Reorder a bucket around the selected track.
///
/// With `next_play` the selected track moves to the front; with `refresh`
/// it is excluded entirely. The rest is split into query matches and
/// non-matches, both shuffled, non-matches first.
pub fn reorder_for_selection(
    tracks: Vec<Track>,
    target_id: Option<&str>,
    query: &str,
    is_refresh: bool,
) -> Vec<Track> {
    if tracks.is_empty() {
        return tracks;
    }

    let query_lower = query.to_lowercase();
    let mut playing: Option<Track> = None;
    let mut others: Vec<Track> = Vec::new();

    match target_id {
        Some(tid) => {
            for track in tracks {
                if playing.is_none() && track.video_id == tid {
                    playing = Some(track);
                } else {
                    others.push(track);
                }
            }
        }
        None => others = tracks,
    }

    // Fall back to a title match, then to the first track when selecting
    if playing.is_none() {
        if let Some(pos) = others.iter().position(|t| {
            let title = t.title.to_lowercase();
            title == query_lower || title.contains(&query_lower)
        }) {
            playing = Some(others.remove(pos));
        }
    }
    if playing.is_none() && !is_refresh && !others.is_empty() {
        playing = Some(others.remove(0));
    }

    let (matches, mut non_matches): (Vec<Track>, Vec<Track>) = others
        .into_iter()
        .partition(|t| t.title.to_lowercase().contains(&query_lower));

    let mut rng = rand::thread_rng();
    let mut matches = matches;
    matches.shuffle(&mut rng);
    non_matches.shuffle(&mut rng);

    let mut reordered = Vec::new();
    if let Some(playing) = playing {
        if !is_refresh {
            reordered.push(playing);
        }
    }
    reordered.extend(non_matches);
    reordered.extend(matches);
    reordered
}

fn find_video_id(tracks: &[Track], query: &str) -> Option<String> {
    let query_lower = query.to_lowercase();
    tracks
        .iter()
        .find(|t| t.title.to_lowercase() == query_lower)
        .or_else(|| {
            tracks
                .iter()
                .find(|t| t.title.to_lowercase().contains(&query_lower))
        })
        .map(|t| t.video_id.clone())
}

fn cache_key(query: &str, limit: u32, video_id: Option<&str>) -> String {
    match video_id {
        Some(vid) if !vid.is_empty() => format!("{}_{}_{}", query, limit, vid),
        _ => format!("{}_{}", query, limit),
    }
}

fn default_limit() -> u32 {
    20
}

fn default_max_vol() -> u32 {
    100
}

fn default_music_type() -> String {
    "songs".to_string()
}

#[derive(Debug, Deserialize)]
pub struct RecommendationsForm {
    pub query: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default, rename = "nextPlay")]
    pub next_play: bool,
    #[serde(default = "default_max_vol", rename = "maxVol")]
    pub max_vol: u32,
    #[serde(default = "default_music_type")]
    pub music_type: String,
    #[serde(default, rename = "videoId")]
    pub video_id: Option<String>,
    #[serde(default)]
    pub refresh: bool,
}

/// POST /recommendations - search the catalog and return ranked tracks
pub async fn recommendations_route(
    State(state): State<AppState>,
    Form(form): Form<RecommendationsForm>,
) -> impl IntoResponse {
    let limit = form.limit.clamp(1, 50);
    let max_vol = form.max_vol.clamp(1, 100);
    let mut query = form.query.clone();
    let mut target_id: Option<String> = None;
    let mut exclude_title: Option<String> = None;

    info!(
        "Searching for: {} (type: {}, videoId: {:?}, refresh: {})",
        query, form.music_type, form.video_id, form.refresh
    );

    if form.refresh {
        // Anchor recommendations to the first track but don't play it
        let tracks = state.tracks.read().await;
        if let Some(first) = tracks.first() {
            target_id = Some(first.video_id.clone());
            query = first.title.clone();
            exclude_title = Some(query.to_lowercase());
        }
    } else if form.next_play {
        target_id = match form.video_id.as_deref() {
            Some(vid) if !vid.is_empty() => Some(vid.to_string()),
            _ => {
                let tracks = state.tracks.read().await;
                find_video_id(&tracks, &query)
            }
        };
        exclude_title = Some(query.to_lowercase());

        if let Some(tid) = &target_id {
            let play = json!({
                "type": "play",
                "data": {"videoId": tid, "title": &query, "timestamp": 20}
            });
            state.hub.broadcast(&play, None).await;
        }
    }

    let key = cache_key(&query, limit, form.video_id.as_deref());
    if !form.refresh {
        if let Some(cached) = state.cache.read().await.get(&key) {
            return Json(cached.clone()).into_response();
        }
    }

    // Phase 1: search songs and videos in parallel
    let (song_search, video_search) = tokio::join!(
        MUSIC_CONTROLLER.search(&query, "songs", 3),
        MUSIC_CONTROLLER.search(&query, "videos", 3),
    );
    let song_search = song_search.unwrap_or_else(|e| {
        error!("Error in song search: {}", e);
        Vec::new()
    });
    let video_search = video_search.unwrap_or_else(|e| {
        error!("Error in video search: {}", e);
        Vec::new()
    });

    let mut song_tracks = process_results(&song_search, "song", exclude_title.as_deref());
    let mut video_tracks = process_results(&video_search, "video", exclude_title.as_deref());

    // Phase 2: fetch related tracks anchored on the selection or top result
    let song_anchor = target_id
        .clone()
        .or_else(|| song_tracks.first().map(|t| t.video_id.clone()));
    let video_anchor = target_id
        .clone()
        .or_else(|| video_tracks.first().map(|t| t.video_id.clone()));

    let fetch_related = |anchor: Option<String>| async move {
        match anchor {
            Some(id) => MUSIC_CONTROLLER
                .watch_playlist(&id, limit, false)
                .await
                .unwrap_or_else(|e| {
                    error!("Error fetching related tracks: {}", e);
                    Vec::new()
                }),
            None => Vec::new(),
        }
    };
    let (song_related, video_related) =
        tokio::join!(fetch_related(song_anchor), fetch_related(video_anchor));

    merge_related(
        &mut song_tracks,
        process_results(&song_related, "song", exclude_title.as_deref()),
        target_id.as_deref(),
        limit as usize,
    );
    merge_related(
        &mut video_tracks,
        process_results(&video_related, "video", exclude_title.as_deref()),
        target_id.as_deref(),
        limit as usize,
    );

    if form.next_play || form.refresh {
        if target_id.is_none() {
            target_id = song_tracks
                .first()
                .map(|t| t.video_id.clone())
                .or_else(|| video_tracks.first().map(|t| t.video_id.clone()));
        }
        song_tracks = reorder_for_selection(song_tracks, target_id.as_deref(), &query, form.refresh);
        video_tracks =
            reorder_for_selection(video_tracks, target_id.as_deref(), &query, form.refresh);
    }

    let mut out_tracks: Vec<Track> = song_tracks.iter().chain(video_tracks.iter()).cloned().collect();
    for (idx, track) in out_tracks.iter_mut().enumerate() {
        track.index = idx;
    }
    *state.tracks.write().await = out_tracks.clone();

    let context = RecommendationContext {
        query,
        tracks: out_tracks,
        song_tracks,
        video_tracks,
        rec_limit: limit,
        max_vol,
        music_type: form.music_type,
    };
    state.cache.write().await.insert(key, context.clone());

    Json(context).into_response()
}

/// GET /track/{idx} - select a track and fetch its lyrics split into verses
pub async fn track_route(
    State(state): State<AppState>,
    Path(idx): Path<i64>,
) -> impl IntoResponse {
    if idx < 0 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "idx must be >= 0"})),
        )
            .into_response();
    }
    let idx = idx as usize;

    let track = {
        let tracks = state.tracks.read().await;
        if idx >= tracks.len() {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": format!("idx {} out of range (0..{})", idx, tracks.len().max(1) - 1)
                })),
            )
                .into_response();
        }
        tracks[idx].clone()
    };

    let selected = json!({
        "index": idx,
        "title": track.title,
        "artist": track.artist,
        "videoId": track.video_id,
        "music_url": track.music_url,
    });

    let mut verses = Vec::new();
    let mut source = "Unknown";
    if LYRICS_CONTROLLER.is_configured() {
        let artist = (!track.artist.is_empty()).then_some(track.artist.as_str());
        match LYRICS_CONTROLLER.search_lyrics(&track.title, artist).await {
            Ok(payload) => {
                if let Value::Array(items) = &payload.data {
                    let lines: Vec<String> = items
                        .iter()
                        .filter_map(|l| l.as_str().map(|s| s.to_string()))
                        .collect();
                    verses = detect_verses(&lines, VERSE_GAP_THRESHOLD);
                }
                source = "RapidAPI";
            }
            Err(e) => warn!("Lyrics fetch failed for '{}': {}", track.title, e),
        }
    }

    // Remember the selection so the player can jump to the first verse
    {
        let mut next = state.hub.next_song.write().await;
        next.title = Some(track.title.clone());
        next.video_id = Some(track.video_id.clone());
        next.timestamp = verses
            .first()
            .map(|v| v.start_time as u32)
            .unwrap_or(20);
    }

    Json(json!({
        "selected_track": selected,
        "verse": verses,
        "source": source,
    }))
    .into_response()
}

fn default_radio_limit() -> u32 {
    50
}

#[derive(Debug, Deserialize)]
pub struct RadioForm {
    #[serde(rename = "videoId")]
    pub video_id: String,
    #[serde(default = "default_radio_limit")]
    pub limit: u32,
}

/// Resolve an audio-only track to its music-video counterpart, falling back
/// to the original id on any failure.
async fn resolve_video_seed(video_id: &str) -> String {
    let metadata = match MUSIC_CONTROLLER.get_song(video_id).await {
        Ok(m) => m,
        Err(e) => {
            warn!("Video resolution failed for {}: {}", video_id, e);
            return video_id.to_string();
        }
    };

    let details = metadata.get("videoDetails").cloned().unwrap_or(Value::Null);
    let music_type = details
        .get("musicVideoType")
        .and_then(|t| t.as_str())
        .unwrap_or("");
    if music_type != "MUSIC_VIDEO_TYPE_ATV" {
        return video_id.to_string();
    }

    let title = details.get("title").and_then(|t| t.as_str()).unwrap_or("");
    info!("Detected audio-only track ({}). Searching for video version...", video_id);
    let search_query = format!("{} video song", title);
    match MUSIC_CONTROLLER.search(&search_query, "videos", 1).await {
        Ok(results) => results
            .first()
            .and_then(|r| r.get("videoId"))
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| video_id.to_string()),
        Err(e) => {
            warn!("Video resolution search failed: {}", e);
            video_id.to_string()
        }
    }
}

/// POST /radio - start radio mode: audio playlist plus a video playlist
/// seeded from the resolved video version of the track
pub async fn radio_route(
    State(state): State<AppState>,
    Form(form): Form<RadioForm>,
) -> impl IntoResponse {
    info!("Starting radio mode for videoId: {}", form.video_id);

    // Audio playlist fetch and video id resolution run concurrently
    let (raw_audio, video_seed) = tokio::join!(
        MUSIC_CONTROLLER.watch_playlist(&form.video_id, form.limit, true),
        resolve_video_seed(&form.video_id),
    );
    let raw_audio = match raw_audio {
        Ok(tracks) => tracks,
        Err(e) => {
            error!("Error starting radio: {}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": format!("Radio playlist fetch failed: {}", e)})),
            )
                .into_response();
        }
    };

    let raw_video = match MUSIC_CONTROLLER
        .watch_playlist(&video_seed, form.limit, true)
        .await
    {
        Ok(tracks) => tracks,
        Err(e) => {
            error!("Error starting radio: {}", e);
            return (
                StatusCode::BAD_GATEWAY,
                Json(json!({"error": format!("Radio playlist fetch failed: {}", e)})),
            )
                .into_response();
        }
    };

    let audio_tracks = process_playlist_tracks(&raw_audio, "Radio Mix");
    let video_tracks = process_playlist_tracks(&raw_video, "Video Mix");

    let mut out_tracks: Vec<Track> = audio_tracks
        .iter()
        .chain(video_tracks.iter())
        .cloned()
        .collect();
    for (idx, track) in out_tracks.iter_mut().enumerate() {
        track.index = idx;
    }
    *state.tracks.write().await = out_tracks;

    Json(json!({
        "status": "success",
        "message": "Dual Radio Started",
        "tracks": audio_tracks,
        "videos": video_tracks,
    }))
    .into_response()
}

fn default_country() -> String {
    "IN".to_string()
}

#[derive(Debug, Deserialize)]
pub struct ChartsQuery {
    #[serde(default = "default_country")]
    pub country: String,
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn failsafe_tracks() -> Vec<Track> {
    [
        ("k4yXQkGDbLY", "Shape of You", "Ed Sheeran"),
        ("JGwWNGJdvx8", "Despacito", "Luis Fonsi"),
        ("OPf0YbXqDm0", "Uptown Funk", "Mark Ronson"),
        ("09R8_2nJtjg", "Sugar", "Maroon 5"),
    ]
    .iter()
    .map(|(id, title, artist)| Track {
        title: title.to_string(),
        artist: artist.to_string(),
        video_id: id.to_string(),
        music_url: Track::music_url_for(id),
        thumbnail: format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", id),
        kind: "chart".to_string(),
        labels: vec!["Hit".to_string()],
        weight: 10,
        index: 0,
    })
    .collect()
}

/// GET /charts - dynamic playlist from the recommender, failsafe hits while
/// the catalog is still building. Never errors on upstream trouble.
pub async fn charts_route(
    State(state): State<AppState>,
    Query(params): Query<ChartsQuery>,
) -> impl IntoResponse {
    if params.country.len() != 2 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "country must be a 2-letter code"})),
        )
            .into_response();
    }

    let playlist = state.recommender.generate_dynamic_playlist(50).await;

    let (top_songs, trending) = if playlist.is_empty() {
        warn!("Recommender not ready, using hardcoded failsafe");
        let failsafe = failsafe_tracks();
        (failsafe.clone(), failsafe)
    } else {
        let formatted: Vec<Track> = playlist
            .into_iter()
            .map(|song| Track {
                title: song.title,
                artist: song.artist,
                music_url: Track::music_url_for(&song.video_id),
                thumbnail: song.thumbnail,
                video_id: song.video_id,
                kind: "chart".to_string(),
                labels: vec!["Trending".to_string(), capitalize(&song.category)],
                weight: 10,
                index: 0,
            })
            .collect();
        let split = formatted.len().min(25);
        let (songs, trending) = formatted.split_at(split);
        (songs.to_vec(), trending.to_vec())
    };

    Json(json!({
        "country": params.country,
        "top_songs": top_songs,
        "top_videos": Vec::<Track>::new(),
        "trending": trending,
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn raw_track(title: &str, video_id: &str) -> Value {
        json!({
            "title": title,
            "videoId": video_id,
            "artists": [{"name": "Some Artist"}],
            "thumbnails": [{"url": "https://example.com/t.jpg", "width": 60, "height": 60}],
        })
    }

    fn track(title: &str, video_id: &str) -> Track {
        Track {
            title: title.to_string(),
            artist: "Some Artist".to_string(),
            video_id: video_id.to_string(),
            music_url: Track::music_url_for(video_id),
            thumbnail: String::new(),
            kind: "song".to_string(),
            labels: Vec::new(),
            weight: 0,
            index: 0,
        }
    }

    #[test]
    fn labels_detected_from_title() {
        assert_eq!(
            detect_labels("Masakali (Official Video) Lyrics"),
            vec!["Official", "Lyrics"]
        );
        assert_eq!(detect_labels("Song - slowed + reverb remix"), vec!["Remix", "Slowed"]);
        // "deliver" must not trigger the Live label
        assert!(detect_labels("Delivered to you").is_empty());
        assert_eq!(detect_labels("Tune (Live at Wembley)"), vec!["Live"]);
    }

    #[test]
    fn official_tracks_sort_first() {
        let raws = vec![
            raw_track("plain song", "v1"),
            raw_track("hit song (official video)", "v2"),
        ];
        let tracks = process_results(&raws, "song", None);
        assert_eq!(tracks[0].video_id, "v2");
        assert_eq!(tracks[0].weight, 10);
        assert_eq!(tracks[1].weight, 0);
    }

    #[test]
    fn official_release_type_adds_weight_for_songs_only() {
        let mut raw = raw_track("some tune", "v1");
        raw["type"] = json!("MUSIC_VIDEO_TYPE_OFFICIAL_RELEASE");
        assert_eq!(process_results(&[raw.clone()], "song", None)[0].weight, 5);
        assert_eq!(process_results(&[raw], "video", None)[0].weight, 0);
    }

    #[test]
    fn tracks_without_id_or_title_are_dropped() {
        let raws = vec![
            json!({"title": "no id", "videoId": ""}),
            json!({"videoId": "v9"}),
            raw_track("kept", "v1"),
        ];
        let tracks = process_results(&raws, "song", None);
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].video_id, "v1");
    }

    #[test]
    fn filter_title_excludes_exact_matches() {
        let raws = vec![raw_track("Masakali", "v1"), raw_track("Other", "v2")];
        let tracks = process_results(&raws, "song", Some("masakali"));
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].video_id, "v2");
    }

    #[test]
    fn picks_largest_thumbnail() {
        let raw = json!({
            "thumbnails": [
                {"url": "https://example.com/small.jpg", "width": 60, "height": 60},
                {"url": "https://example.com/big.jpg", "width": 544, "height": 544},
            ]
        });
        assert_eq!(pick_thumbnail(&raw, "vid"), "https://example.com/big.jpg");
    }

    #[test]
    fn upscales_googleusercontent_urls() {
        let raw = json!({
            "thumbnails": [{"url": "https://lh3.googleusercontent.com/abc=w60-h60", "width": 60, "height": 60}]
        });
        assert_eq!(
            pick_thumbnail(&raw, "vid"),
            "https://lh3.googleusercontent.com/abc=w512-h512-l90-rj"
        );
    }

    #[test]
    fn falls_back_to_video_thumbnail() {
        assert_eq!(
            pick_thumbnail(&json!({}), "abc123"),
            "https://i.ytimg.com/vi/abc123/hqdefault.jpg"
        );
    }

    #[test]
    fn merge_related_dedupes_and_caps() {
        let mut bucket = vec![track("a", "v1")];
        let related = vec![
            track("dup", "v1"),
            track("anchor", "anchor-id"),
            track("b", "v2"),
            track("c", "v3"),
        ];
        merge_related(&mut bucket, related, Some("anchor-id"), 3);
        let ids: Vec<&str> = bucket.iter().map(|t| t.video_id.as_str()).collect();
        assert_eq!(ids, vec!["v1", "v2", "v3"]);
    }

    #[test]
    fn reorder_puts_selection_first_for_next_play() {
        let tracks = vec![track("one", "v1"), track("two", "v2"), track("three", "v3")];
        let reordered = reorder_for_selection(tracks, Some("v2"), "two", false);
        assert_eq!(reordered[0].video_id, "v2");
        assert_eq!(reordered.len(), 3);
    }

    #[test]
    fn reorder_excludes_selection_on_refresh() {
        let tracks = vec![track("one", "v1"), track("two", "v2"), track("three", "v3")];
        let reordered = reorder_for_selection(tracks, Some("v2"), "two", true);
        assert_eq!(reordered.len(), 2);
        assert!(reordered.iter().all(|t| t.video_id != "v2"));
    }

    #[test]
    fn reorder_places_query_matches_last() {
        let tracks = vec![
            track("acoustic cover of two", "v1"),
            track("unrelated", "v2"),
            track("two again", "v3"),
            track("something else", "v4"),
        ];
        // v1 becomes the selection (title contains the query)
        let reordered = reorder_for_selection(tracks, None, "two", false);
        assert_eq!(reordered[0].video_id, "v1");
        let rest: Vec<&str> = reordered[1..].iter().map(|t| t.video_id.as_str()).collect();
        // non-matches before matches regardless of shuffle order
        let match_pos = rest.iter().position(|id| *id == "v3").unwrap();
        assert!(rest[..match_pos].iter().all(|id| *id != "v3"));
        assert_eq!(rest.len(), 3);
    }

    #[test]
    fn cache_key_includes_video_id_when_present() {
        assert_eq!(cache_key("song", 20, None), "song_20");
        assert_eq!(cache_key("song", 20, Some("vid")), "song_20_vid");
        assert_eq!(cache_key("song", 20, Some("")), "song_20");
    }

    #[tokio::test]
    async fn search_accepts_wrapped_and_bare_lists() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .and(query_param("q", "masakali"))
            .and(query_param("filter", "songs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [raw_track("Masakali", "v1")]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/next"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([raw_track("Related", "v2")])),
            )
            .mount(&server)
            .await;

        let controller = MusicApiController::with_base_url(server.uri(), String::new());
        let results = controller.search("masakali", "songs", 3).await.unwrap();
        assert_eq!(results.len(), 1);

        let related = controller.watch_playlist("v1", 25, false).await.unwrap();
        assert_eq!(related.len(), 1);
    }

    #[tokio::test]
    async fn upstream_error_is_propagated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let controller = MusicApiController::with_base_url(server.uri(), String::new());
        let err = controller.search("q", "songs", 3).await.unwrap_err();
        assert!(err.to_string().contains("500"));
    }
}
