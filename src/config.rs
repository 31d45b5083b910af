//! Environment-backed configuration.
//!
//! Startup never fails on a missing credential: a missing Notion token
//! surfaces later as a failed Notion call, and a missing OMDb key is
//! rejected by the metadata fetcher before it touches the network.

use std::env;

use tracing::warn;

/// Default name of the rich-title property read from the page.
pub const DEFAULT_TITLE_PROPERTY: &str = "이름";

const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, Clone)]
pub struct Config {
    pub notion_token: String,
    pub notion_version: String,
    pub omdb_api_key: Option<String>,
    pub title_property: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let notion_token = get("NOTION_TOKEN").unwrap_or_default();
        if notion_token.trim().is_empty() {
            warn!("NOTION_TOKEN is not set; Notion calls will fail");
        }

        let omdb_api_key = get("OMDB_API_KEY").filter(|key| !key.trim().is_empty());
        if omdb_api_key.is_none() {
            warn!("OMDB_API_KEY is not set; metadata lookups will be rejected");
        }

        let port = match get("PORT") {
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                warn!("failed to parse PORT, using default {}", DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            notion_token,
            notion_version: get("NOTION_VERSION")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string()),
            omdb_api_key,
            title_property: get("NOTION_TITLE_PROPERTY")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE_PROPERTY.to_string()),
            port,
        }
    }
}
