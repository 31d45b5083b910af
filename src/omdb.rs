//! OMDb metadata fetcher.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::error::Error;

const OMDB_API_BASE: &str = "https://www.omdbapi.com/";
/// Value of the `Response` field OMDb uses to signal "no match".
const NOT_FOUND_SENTINEL: &str = "False";
const NOT_FOUND_FALLBACK: &str = "검색 결과가 없음";

/// Metadata for one movie, fetched per request and never persisted.
#[derive(Debug, Clone, Default)]
pub struct MovieMetadata {
    pub director: String,
    pub plot: String,
    pub genres: Vec<String>,
    pub released: String,
    pub writer: String,
    pub actors: String,
}

#[async_trait]
pub trait MetadataService: Send + Sync {
    async fn fetch_by_title(&self, title: &str) -> Result<MovieMetadata>;
}

#[derive(Debug, Default, Deserialize)]
struct OmdbPayload {
    #[serde(rename = "Response", default)]
    response: String,
    #[serde(rename = "Error", default)]
    error: Option<String>,
    #[serde(rename = "Director", default)]
    director: String,
    #[serde(rename = "Plot", default)]
    plot: String,
    #[serde(rename = "Genre", default)]
    genre: String,
    #[serde(rename = "Released", default)]
    released: String,
    #[serde(rename = "Writer", default)]
    writer: String,
    #[serde(rename = "Actors", default)]
    actors: String,
}

impl OmdbPayload {
    /// Applies the not-found sentinel and the defensive field defaults.
    fn into_metadata(self) -> Result<MovieMetadata> {
        if self.response == NOT_FOUND_SENTINEL {
            let message = self
                .error
                .filter(|msg| !msg.trim().is_empty())
                .unwrap_or_else(|| NOT_FOUND_FALLBACK.to_string());
            return Err(Error::ProviderNotFound(message).into());
        }

        Ok(MovieMetadata {
            director: self.director,
            plot: self.plot,
            genres: split_genres(&self.genre),
            released: self.released,
            writer: self.writer,
            actors: self.actors,
        })
    }
}

/// Splits OMDb's comma-separated genre string, keeping order and dropping
/// blank entries.
fn split_genres(genre: &str) -> Vec<String> {
    genre
        .split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct OmdbClient {
    http: Client,
    api_key: Option<String>,
}

impl OmdbClient {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            api_key,
        }
    }
}

#[async_trait]
impl MetadataService for OmdbClient {
    async fn fetch_by_title(&self, title: &str) -> Result<MovieMetadata> {
        // Checked before any network call.
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(Error::MissingCredential)?;

        debug!(%title, "querying OMDb");
        let res = self
            .http
            .get(OMDB_API_BASE)
            .query(&[("apikey", api_key), ("t", title), ("plot", "full")])
            .send()
            .await
            .context("failed to reach OMDb")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("OMDb error {}: {}", status, body));
        }

        let payload: OmdbPayload = res.json().await.context("invalid OMDb response JSON")?;
        payload.into_metadata()
    }
}
