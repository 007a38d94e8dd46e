// Background catalog recommender built from year-based search queries
use std::collections::{HashMap, HashSet};
use std::time::Instant;

use futures::future::join_all;
use rand::seq::SliceRandom;
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::controllers::music::MUSIC_CONTROLLER;
use crate::models::track::Track;

pub const BOLLYWOOD_2000S: &str = "bollywood_2000s";
pub const BOLLYWOOD_2010S: &str = "bollywood_2010s";
pub const BOLLYWOOD_2020S: &str = "bollywood_2020s";
pub const PUNJABI: &str = "punjabi";
pub const HARYANVI: &str = "haryanvi";
pub const INDIE_REGIONAL: &str = "indie_regional";

#[derive(Serialize, Clone, Debug)]
pub struct CatalogSong {
    pub title: String,
    pub artist: String,
    #[serde(rename = "videoId")]
    pub video_id: String,
    pub thumbnail: String,
    pub music_url: String,
    pub category: String,
    pub era: String,
}

/// Catalog collections built in the background at startup.
///
/// Distribution served by `generate_dynamic_playlist`:
/// 65% Bollywood (balanced across eras), 15% Punjabi, 5% Haryanvi,
/// 15% indie/regional.
pub struct Recommender {
    collections: RwLock<HashMap<String, Vec<CatalogSong>>>,
}

impl Recommender {
    pub fn new() -> Self {
        Recommender {
            collections: RwLock::new(HashMap::new()),
        }
    }

    async fn search_query(&self, query: &str, limit: u32, category: &str, era: &str) -> Vec<CatalogSong> {
        let results = match MUSIC_CONTROLLER.search(query, "songs", limit).await {
            Ok(results) => results,
            Err(e) => {
                warn!("Collection query '{}' failed: {}", query, e);
                return Vec::new();
            }
        };

        results
            .iter()
            .filter_map(|raw| {
                let video_id = raw.get("videoId").and_then(|v| v.as_str())?;
                let title = raw.get("title").and_then(|t| t.as_str())?;
                let artist = raw
                    .get("artists")
                    .and_then(|a| a.get(0))
                    .and_then(|a| a.get("name"))
                    .and_then(|n| n.as_str())
                    .unwrap_or("Various");
                let thumbnail = raw
                    .get("thumbnails")
                    .and_then(|t| t.as_array())
                    .and_then(|t| t.last())
                    .and_then(|t| t.get("url"))
                    .and_then(|u| u.as_str())
                    .unwrap_or("");
                Some(CatalogSong {
                    title: title.to_string(),
                    artist: artist.to_string(),
                    video_id: video_id.to_string(),
                    thumbnail: thumbnail.to_string(),
                    music_url: Track::music_url_for(video_id),
                    category: category.to_string(),
                    era: era.to_string(),
                })
            })
            .collect()
    }

    async fn build_collection(
        &self,
        key: &str,
        category: &str,
        era: &str,
        queries: &[(&str, u32)],
    ) {
        let fetches = queries
            .iter()
            .map(|(query, limit)| self.search_query(query, *limit, category, era));
        let songs: Vec<CatalogSong> = join_all(fetches).await.into_iter().flatten().collect();
        info!("Collection {} built with {} songs", key, songs.len());
        self.store(key, songs).await;
    }

    pub(crate) async fn store(&self, key: &str, songs: Vec<CatalogSong>) {
        self.collections.write().await.insert(key.to_string(), songs);
    }

    /// Build all collections concurrently. Individual query failures are
    /// logged and skipped; this never fails as a whole.
    pub async fn build_all_collections(&self) {
        info!("Building all catalog collections in the background...");
        let started = Instant::now();

        tokio::join!(
            self.build_collection(
                BOLLYWOOD_2000S,
                "bollywood",
                "2000s",
                &[
                    ("top bollywood songs 2000", 5),
                    ("best hindi songs 2002", 5),
                    ("superhit bollywood songs 2004", 5),
                    ("top hindi songs 2006", 5),
                    ("best bollywood hits 2008", 5),
                    ("bollywood romantic songs 2000s", 4),
                    ("bollywood dance songs 2000-2009", 4),
                ],
            ),
            self.build_collection(
                BOLLYWOOD_2010S,
                "bollywood",
                "2010s",
                &[
                    ("top bollywood songs 2010", 5),
                    ("best hindi songs 2012", 5),
                    ("superhit bollywood songs 2014", 5),
                    ("top hindi songs 2016", 5),
                    ("best bollywood hits 2018", 5),
                    ("bollywood romantic songs 2010s", 4),
                    ("bollywood wedding songs 2010s", 4),
                ],
            ),
            self.build_collection(
                BOLLYWOOD_2020S,
                "bollywood",
                "2020s",
                &[
                    ("top bollywood songs 2020", 5),
                    ("best hindi songs 2021", 5),
                    ("superhit bollywood songs 2022", 5),
                    ("top hindi songs 2023", 5),
                    ("best bollywood hits 2024", 5),
                    ("latest bollywood hits 2025", 4),
                    ("bollywood trending songs 2025", 4),
                ],
            ),
            self.build_collection(
                PUNJABI,
                "punjabi",
                "multi",
                &[
                    ("top punjabi songs 2018", 3),
                    ("best punjabi hits 2020", 3),
                    ("superhit punjabi songs 2022", 3),
                    ("top punjabi songs 2024", 3),
                    ("punjabi party songs latest", 3),
                    ("punjabi bhangra songs top", 3),
                ],
            ),
            self.build_collection(
                HARYANVI,
                "haryanvi",
                "multi",
                &[
                    ("top haryanvi songs 2022", 3),
                    ("best haryanvi hits 2024", 3),
                    ("haryanvi dance songs latest", 2),
                    ("haryanvi dj songs best", 2),
                ],
            ),
            self.build_collection(
                INDIE_REGIONAL,
                "indie_regional",
                "multi",
                &[
                    ("top indian indie songs 2023", 3),
                    ("best indian indie songs 2024", 3),
                    ("indian indie pop songs best", 2),
                    ("top tamil songs 2024", 2),
                    ("top telugu songs 2024", 2),
                    ("indian hip hop songs best", 2),
                ],
            ),
        );

        let total: usize = self.collections.read().await.values().map(|v| v.len()).sum();
        info!(
            "All collections built in {:.2}s ({} songs)",
            started.elapsed().as_secs_f64(),
            total
        );
    }

    /// Generate a shuffled playlist honoring the category distribution.
    /// Returns an empty playlist while the collections are still building.
    pub async fn generate_dynamic_playlist(&self, total_songs: usize) -> Vec<CatalogSong> {
        let collections = self.collections.read().await;
        let mut rng = rand::thread_rng();

        let bollywood_count = total_songs * 65 / 100;
        let punjabi_count = total_songs * 15 / 100;
        let haryanvi_count = total_songs * 5 / 100;
        let indie_count = total_songs * 15 / 100;

        let mut playlist: Vec<CatalogSong> = Vec::new();

        // Bollywood: equal representation from each era first
        let songs_per_era = bollywood_count / 3;
        for era_key in [BOLLYWOOD_2000S, BOLLYWOOD_2010S, BOLLYWOOD_2020S] {
            if let Some(era_songs) = collections.get(era_key) {
                playlist.extend(
                    era_songs
                        .choose_multiple(&mut rng, songs_per_era.min(era_songs.len()))
                        .cloned(),
                );
            }
        }

        // Fill remaining Bollywood slots from any era
        let picked: HashSet<String> = playlist.iter().map(|s| s.video_id.clone()).collect();
        let remaining = bollywood_count.saturating_sub(playlist.len());
        if remaining > 0 {
            let available: Vec<&CatalogSong> = [BOLLYWOOD_2000S, BOLLYWOOD_2010S, BOLLYWOOD_2020S]
                .iter()
                .filter_map(|key| collections.get(*key))
                .flatten()
                .filter(|s| !picked.contains(&s.video_id))
                .collect();
            playlist.extend(
                available
                    .choose_multiple(&mut rng, remaining.min(available.len()))
                    .map(|s| (*s).clone()),
            );
        }

        for (key, count) in [
            (PUNJABI, punjabi_count),
            (HARYANVI, haryanvi_count),
            (INDIE_REGIONAL, indie_count),
        ] {
            if let Some(songs) = collections.get(key) {
                playlist.extend(
                    songs
                        .choose_multiple(&mut rng, count.min(songs.len()))
                        .cloned(),
                );
            }
        }

        playlist.shuffle(&mut rng);
        playlist.truncate(total_songs);
        playlist
    }

    #[allow(dead_code)]
    pub async fn snapshot(&self) -> HashMap<String, Vec<CatalogSong>> {
        self.collections.read().await.clone()
    }
}
