//! Spotify Web API catalog search.
//!
//! Uses the client-credentials flow: an app token is fetched from the accounts
//! service with HTTP basic auth and cached until shortly before it expires.
//! Searches call `GET /v1/search?type=track`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use url::Url;

use super::{CatalogError, CatalogSearch};
use crate::session::Track;

/// Default accounts service base URL (token endpoint).
const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";

/// Default Web API base URL.
const DEFAULT_API_URL: &str = "https://api.spotify.com";

const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

/// Tokens are refreshed this long before their advertised expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Spotify caps `limit` at 50.
const MAX_LIMIT: usize = 50;

// ==================== Spotify API Response Types ====================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<TrackPage>,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<SpotifyTrack>,
}

#[derive(Debug, Deserialize)]
struct SpotifyTrack {
    name: String,
    #[serde(default)]
    artists: Vec<SpotifyArtist>,
    #[serde(default)]
    duration_ms: u64,
    external_urls: ExternalUrls,
    album: Option<SpotifyAlbum>,
}

#[derive(Debug, Deserialize)]
struct SpotifyArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SpotifyAlbum {
    #[serde(default)]
    images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
struct SpotifyImage {
    url: String,
}

impl SpotifyTrack {
    /// Tracks without a public URL cannot be downloaded and are dropped.
    fn into_track(self) -> Option<Track> {
        let external_url = self.external_urls.spotify?;
        let cover_art_url = self
            .album
            .and_then(|album| album.images.into_iter().next())
            .map(|image| image.url);
        Some(Track {
            title: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
            duration_ms: self.duration_ms,
            external_url,
            cover_art_url,
        })
    }
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    refresh_at: Instant,
}

// ==================== SpotifyCatalog ====================

/// [`CatalogSearch`] over the Spotify Web API.
pub struct SpotifyCatalog {
    client: Client,
    accounts_url: String,
    api_url: String,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<CachedToken>>,
}

impl std::fmt::Debug for SpotifyCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCatalog")
            .field("accounts_url", &self.accounts_url)
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl SpotifyCatalog {
    /// Creates a catalog client for the public Spotify endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if HTTP client construction fails.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        Self::with_base_urls(client_id, client_secret, DEFAULT_ACCOUNTS_URL, DEFAULT_API_URL)
    }

    /// Creates a catalog client with custom base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if HTTP client construction fails.
    pub fn with_base_urls(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        accounts_url: impl Into<String>,
        api_url: impl Into<String>,
    ) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()
            .map_err(CatalogError::network)?;
        Ok(Self {
            client,
            accounts_url: accounts_url.into().trim_end_matches('/').to_string(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            token: Mutex::new(None),
        })
    }

    /// Returns a valid access token, fetching a new one when needed.
    async fn access_token(&self) -> Result<String, CatalogError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        debug!("requesting Spotify access token");
        let response = self
            .client
            .post(format!("{}/api/token", self.accounts_url))
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded",
            )
            .body("grant_type=client_credentials")
            .send()
            .await
            .map_err(CatalogError::network)?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "Spotify token request rejected");
            return Err(CatalogError::auth(format!("token endpoint returned HTTP {status}")));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::auth(format!("invalid token response: {e}")))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }

    fn search_url(&self, query: &str, limit: usize) -> Result<Url, CatalogError> {
        let mut url = Url::parse(&format!("{}/v1/search", self.api_url))
            .map_err(|e| CatalogError::invalid_response(format!("bad API base URL: {e}")))?;
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("type", "track")
            .append_pair("limit", &limit.clamp(1, MAX_LIMIT).to_string());
        Ok(url)
    }
}

#[async_trait]
impl CatalogSearch for SpotifyCatalog {
    #[instrument(skip(self), fields(catalog = "spotify"))]
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Track>, CatalogError> {
        let token = self.access_token().await?;
        let url = self.search_url(query, limit)?;

        let response = self
            .client
            .get(url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(CatalogError::network)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // Token revoked early; forget it so the next search re-authenticates.
            *self.token.lock().await = None;
        }
        if !status.is_success() {
            warn!(status = status.as_u16(), "Spotify search failed");
            return Err(CatalogError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::invalid_response(e.to_string()))?;
        let tracks: Vec<Track> = body
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .filter_map(SpotifyTrack::into_track)
            .collect();

        debug!(count = tracks.len(), "Spotify search complete");
        Ok(tracks)
    }
}
