//! The media catalog HTTP client (spec.md §6): `GET /api/v1/media?search=`
//! and `GET /api/v1/media/{id}`, retried up to 3 times with 1s/2s
//! exponential backoff; 404 maps to "not found", anything else
//! (non-2xx or network failure) maps to `None` after the retries run out.

use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::error::BrokerError;

#[derive(Debug, Clone, Deserialize)]
pub struct MediaResult {
    #[serde(alias = "friendly_token", alias = "id")]
    pub id: String,
    pub title: String,
    pub duration: i64,
    pub media_type: String,
    pub media_id: String,
}

#[derive(Debug, Deserialize)]
struct MediaSearchResponse {
    results: Vec<MediaResult>,
}

const BACKOFF: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];

#[derive(Debug, Clone)]
pub struct MediaCatalogClient {
    http: reqwest::Client,
    base_url: String,
}

impl MediaCatalogClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BrokerError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| BrokerError::MediaCatalog(error.to_string()))?;
        Ok(Self { http, base_url: base_url.into() })
    }

    /// `None` covers both "not found" and "exhausted retries" (spec.md
    /// §6: any non-2xx or network failure maps to null after retries).
    pub async fn search(&self, query: &str) -> Result<Vec<MediaResult>, BrokerError> {
        let url = format!("{}/api/v1/media?search={}", self.base_url, urlencoding(query));
        let Some(response) = self.get_with_retries(&url).await else {
            return Ok(Vec::new());
        };
        let parsed: MediaSearchResponse = response.json().await.map_err(|error| BrokerError::MediaCatalog(error.to_string()))?;
        Ok(parsed.results)
    }

    pub async fn get(&self, id: &str) -> Result<Option<MediaResult>, BrokerError> {
        let url = format!("{}/api/v1/media/{}", self.base_url, id);
        let Some(response) = self.get_with_retries(&url).await else {
            return Ok(None);
        };
        let parsed: MediaResult = response.json().await.map_err(|error| BrokerError::MediaCatalog(error.to_string()))?;
        Ok(Some(parsed))
    }

    async fn get_with_retries(&self, url: &str) -> Option<reqwest::Response> {
        for (attempt, delay) in std::iter::once(None).chain(BACKOFF.into_iter().map(Some)).enumerate() {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            match self.http.get(url).send().await {
                Ok(response) if response.status() == reqwest::StatusCode::NOT_FOUND => return None,
                Ok(response) if response.status().is_success() => return Some(response),
                Ok(response) => {
                    warn!(url, status = %response.status(), attempt, "media catalog non-2xx response");
                }
                Err(error) => {
                    warn!(url, %error, attempt, "media catalog request failed");
                }
            }
        }
        None
    }
}

fn urlencoding(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(byte as char),
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}
