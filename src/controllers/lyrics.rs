// RapidAPI lyrics relay
use std::time::Duration;

use anyhow::anyhow;
use axum::{
    extract::Query,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use once_cell::sync::Lazy;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info};

use crate::models::lyrics::LyricsPayload;
use crate::secrets::SECRET_MANAGER;

/// Path of the Musixmatch-style search endpoint on the RapidAPI host.
pub const LYRICS_PATH: &str = "/v1/social/spotify/musixmatchsearchlyrics";

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(15);

/// Pause before hitting the upstream, to be gentle on the paid API.
const UPSTREAM_DELAY: Duration = Duration::from_millis(500);

pub struct LyricsController {
    client: Client,
    url: String,
    api_key: String,
    host: String,
}

impl LyricsController {
    pub fn new() -> Self {
        let host = SECRET_MANAGER.get("RAPIDAPI_HOST");
        let url = format!("https://{}{}", host, LYRICS_PATH);
        Self::with_url(url, SECRET_MANAGER.get("RAPIDAPI_KEY"), host)
    }

    pub fn with_url(url: String, api_key: String, host: String) -> Self {
        LyricsController {
            client: Client::new(),
            url,
            api_key,
            host,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    /// Query the RapidAPI lyrics endpoint and forward its status/data shape.
    pub async fn search_lyrics(
        &self,
        title: &str,
        artist: Option<&str>,
    ) -> Result<LyricsPayload, anyhow::Error> {
        let mut params: Vec<(&str, &str)> = vec![("terms", title)];
        if let Some(artist) = artist {
            params.push(("artist", artist));
        }

        tokio::time::sleep(UPSTREAM_DELAY).await;

        let response = self
            .client
            .get(&self.url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .query(&params)
            .timeout(UPSTREAM_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(500).collect();
            return Err(anyhow!("RapidAPI HTTP error: {} - {}", status, excerpt));
        }

        let data: Value = response.json().await?;
        // forward the status/data shape as-is
        let payload_status = data
            .get("status")
            .cloned()
            .unwrap_or_else(|| Value::from(status.as_u16()));
        let payload_data = data.get("data").cloned().unwrap_or(data);
        Ok(LyricsPayload {
            status: payload_status,
            data: payload_data,
        })
    }
}

pub static LYRICS_CONTROLLER: Lazy<LyricsController> = Lazy::new(|| LyricsController::new());

#[derive(Debug, Deserialize)]
pub struct LyricsQuery {
    pub title: String,
    pub artist: Option<String>,
}

/// GET /lyrics - relay a lyrics search to the RapidAPI upstream
pub async fn lyrics_route(Query(params): Query<LyricsQuery>) -> impl IntoResponse {
    if !LYRICS_CONTROLLER.is_configured() {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "error": "Missing RAPIDAPI_KEY environment variable"
            })),
        )
            .into_response();
    }

    match LYRICS_CONTROLLER
        .search_lyrics(&params.title, params.artist.as_deref())
        .await
    {
        Ok(payload) => {
            info!("Lyrics lookup succeeded for '{}'", params.title);
            Json(payload).into_response()
        }
        Err(e) => {
            error!("Lyrics lookup failed for '{}': {}", params.title, e);
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn controller_for(server: &MockServer) -> LyricsController {
        LyricsController::with_url(
            format!("{}{}", server.uri(), LYRICS_PATH),
            "test-key".to_string(),
            "test-host".to_string(),
        )
    }

    #[tokio::test]
    async fn forwards_status_and_data_from_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LYRICS_PATH))
            .and(header("x-rapidapi-key", "test-key"))
            .and(header("x-rapidapi-host", "test-host"))
            .and(query_param("terms", "Masakali"))
            .and(query_param("artist", "A. R. Rahman"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": 200,
                "data": ["[00:10.00]line one", "[00:12.00]line two"]
            })))
            .mount(&server)
            .await;

        let controller = controller_for(&server);
        let payload = controller
            .search_lyrics("Masakali", Some("A. R. Rahman"))
            .await
            .unwrap();

        assert_eq!(payload.status, serde_json::json!(200));
        assert_eq!(
            payload.data,
            serde_json::json!(["[00:10.00]line one", "[00:12.00]line two"])
        );
    }

    #[tokio::test]
    async fn wraps_payload_without_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LYRICS_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"lyrics": "plain body"})),
            )
            .mount(&server)
            .await;

        let controller = controller_for(&server);
        let payload = controller.search_lyrics("anything", None).await.unwrap();

        // no status/data envelope upstream: HTTP status and whole body are used
        assert_eq!(payload.status, serde_json::json!(200));
        assert_eq!(payload.data, serde_json::json!({"lyrics": "plain body"}));
    }

    #[tokio::test]
    async fn upstream_error_surfaces_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(LYRICS_PATH))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .mount(&server)
            .await;

        let controller = controller_for(&server);
        let err = controller.search_lyrics("anything", None).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("429"), "missing status in: {}", message);
        assert!(message.contains("rate limited"), "missing body in: {}", message);
    }

    #[test]
    fn unconfigured_without_api_key() {
        let controller = LyricsController::with_url(
            "https://example.invalid".to_string(),
            String::new(),
            "host".to_string(),
        );
        assert!(!controller.is_configured());
    }
}
