//! Travel-music recommendations via the Spotify catalog
//!
//! Two concerns live here: the client-credentials token exchange and the
//! paginated track search. The search client is stateless; the planner owns
//! the offset and the cached credential.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, header};
use serde::Deserialize;
use tracing::debug;

use crate::config::SpotifyConfig;
use crate::error::{PlanError, Result};
use crate::models::{MusicCredential, MusicPage, Track};

/// Fixed page size; the extension operation advances the offset by exactly
/// this much per call
pub const TRACK_PAGE_SIZE: u32 = 6;

/// Deterministic search query for a trip
#[must_use]
pub fn travel_query(origin: &str, destination: &str) -> String {
    format!("{origin} to {destination} travel music")
}

/// Obtains a bearer credential for the music catalog
#[async_trait]
pub trait MusicTokenProvider: Send + Sync {
    async fn fetch_token(&self) -> Result<MusicCredential>;
}

/// Searches the music catalog for one page of tracks
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    async fn search_tracks(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
        credential: &MusicCredential,
    ) -> Result<MusicPage>;
}

/// Spotify Web API client; implements both the token exchange and search
pub struct SpotifyClient {
    http: Client,
    client_id: String,
    client_secret: String,
    token_url: String,
    api_base: String,
}

impl SpotifyClient {
    pub fn new(config: &SpotifyConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("roadtrip/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            http,
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            token_url: config.token_url.clone(),
            api_base: config.api_base.clone(),
        }
    }
}

#[async_trait]
impl MusicTokenProvider for SpotifyClient {
    async fn fetch_token(&self) -> Result<MusicCredential> {
        debug!("Exchanging client credentials for a bearer token");

        let response = self
            .http
            .post(&self.token_url)
            .header(
                header::AUTHORIZATION,
                format!("Basic {}", basic_auth(&self.client_id, &self.client_secret)),
            )
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(|e| PlanError::AuthFailed(format!("token request failed: {e}")))?;

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| PlanError::AuthFailed(format!("token response unreadable: {e}")))?;

        let token = payload
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| PlanError::AuthFailed("response carried no access token".to_string()))?;

        Ok(MusicCredential { token })
    }
}

#[async_trait]
impl MusicCatalog for SpotifyClient {
    async fn search_tracks(
        &self,
        query: &str,
        offset: u32,
        limit: u32,
        credential: &MusicCredential,
    ) -> Result<MusicPage> {
        debug!("Searching tracks at offset {}", offset);

        let url = format!("{}/search", self.api_base);
        let response = self
            .http
            .get(url)
            .bearer_auth(&credential.token)
            .query(&[
                ("q", query.to_string()),
                ("type", "track".to_string()),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ])
            .send()
            .await
            .map_err(|e| PlanError::SearchFailed(format!("search request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PlanError::SearchFailed(format!(
                "search returned status {}",
                response.status()
            )));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| PlanError::SearchFailed(format!("search response unreadable: {e}")))?;

        Ok(page_from(payload, offset))
    }
}

/// Basic-auth payload for the client-credentials exchange
fn basic_auth(client_id: &str, client_secret: &str) -> String {
    base64::engine::general_purpose::STANDARD.encode(format!("{client_id}:{client_secret}"))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackItems>,
}

#[derive(Debug, Deserialize)]
struct TrackItems {
    #[serde(default)]
    items: Vec<TrackItem>,
}

#[derive(Debug, Deserialize)]
struct TrackItem {
    name: String,
    external_urls: Option<ExternalUrls>,
    album: Option<Album>,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Album {
    #[serde(default)]
    images: Vec<AlbumImage>,
}

#[derive(Debug, Deserialize)]
struct AlbumImage {
    url: Option<String>,
}

/// Reshape the catalog response into a page; absent art becomes None
fn page_from(payload: SearchResponse, offset: u32) -> MusicPage {
    let tracks = payload
        .tracks
        .map(|t| t.items)
        .unwrap_or_default()
        .into_iter()
        .map(|item| Track {
            title: item.name,
            play_url: item
                .external_urls
                .and_then(|u| u.spotify)
                .unwrap_or_default(),
            cover_url: item
                .album
                .and_then(|a| a.images.into_iter().next())
                .and_then(|i| i.url),
        })
        .collect();

    MusicPage { tracks, offset }
}
