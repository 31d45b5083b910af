//! Notion API client: one page read, one property write.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::omdb::MovieMetadata;

const NOTION_API_BASE: &str = "https://api.notion.com/";

pub const PROP_DIRECTOR: &str = "감독";
pub const PROP_PLOT_SUMMARY: &str = "줄거리 요약";
pub const PROP_FEATURES: &str = "특징";
pub const PROP_GENRES: &str = "장르";
pub const PROP_RELEASE_DATE: &str = "개봉일";
pub const PROP_CREW: &str = "제작진";
pub const PROP_STATUS: &str = "상태";
const STATUS_DONE: &str = "완료";

/// A retrieved Notion page, reduced to its property map.
#[derive(Debug, Clone, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Page {
    /// Extracts the named rich-title property: every fragment's `plain_text`
    /// concatenated, then trimmed. Accepts both the `title` and `rich_text`
    /// shapes of the property, and reduces a single-fragment title and a
    /// multi-fragment one to the same string.
    pub fn title(&self, property: &str) -> String {
        let fragments = self
            .properties
            .get(property)
            .and_then(|prop| prop.get("title").or_else(|| prop.get("rich_text")))
            .and_then(Value::as_array);
        let Some(fragments) = fragments else {
            return String::new();
        };
        fragments
            .iter()
            .filter_map(|fragment| fragment.get("plain_text").and_then(Value::as_str))
            .collect::<String>()
            .trim()
            .to_string()
    }

    /// Whether the page schema carries a status property we can set.
    pub fn supports_status(&self) -> bool {
        self.properties
            .get(PROP_STATUS)
            .and_then(|prop| prop.get("type"))
            .and_then(Value::as_str)
            == Some("status")
    }
}

#[async_trait]
pub trait NotionService: Send + Sync {
    async fn retrieve_page(&self, page_id: &str) -> Result<Page>;
    async fn update_page(&self, page_id: &str, properties: Map<String, Value>) -> Result<()>;
}

fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

/// Builds the fixed property set written back to the page. The release-date
/// key is left out entirely when no date was derived, and the status key is
/// only present when the destination supports it.
pub fn build_properties(
    meta: &MovieMetadata,
    summary: &str,
    features: &str,
    release_date: Option<&str>,
    supports_status: bool,
) -> Map<String, Value> {
    let mut properties = Map::new();
    properties.insert(PROP_DIRECTOR.to_string(), rich_text(&meta.director));
    properties.insert(PROP_PLOT_SUMMARY.to_string(), rich_text(summary));
    properties.insert(PROP_FEATURES.to_string(), rich_text(features));

    let options: Vec<Value> = meta
        .genres
        .iter()
        .map(|genre| json!({ "name": genre }))
        .collect();
    properties.insert(PROP_GENRES.to_string(), json!({ "multi_select": options }));

    if let Some(date) = release_date {
        properties.insert(
            PROP_RELEASE_DATE.to_string(),
            json!({ "date": { "start": date } }),
        );
    }

    properties.insert(
        PROP_CREW.to_string(),
        rich_text(&format!("각본 {} / 출연 {}", meta.writer, meta.actors)),
    );

    if supports_status {
        properties.insert(
            PROP_STATUS.to_string(),
            json!({ "status": { "name": STATUS_DONE } }),
        );
    }

    properties
}

pub struct NotionClient {
    http: Client,
    base_url: Url,
    token: String,
    version: String,
}

impl NotionClient {
    pub fn new(token: String, version: String) -> Self {
        let base_url = Url::parse(NOTION_API_BASE).expect("valid default Notion URL");
        let http = Client::builder()
            .user_agent("moviebot/0.1")
            .build()
            .expect("reqwest client");
        Self {
            http,
            base_url,
            token,
            version,
        }
    }

    fn page_endpoint(&self, page_id: &str) -> Result<Url> {
        self.base_url
            .join(&format!("v1/pages/{}", page_id))
            .context("invalid Notion page URL")
    }
}

#[async_trait]
impl NotionService for NotionClient {
    async fn retrieve_page(&self, page_id: &str) -> Result<Page> {
        debug!(%page_id, "retrieving Notion page");
        let res = self
            .http
            .get(self.page_endpoint(page_id)?)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
            .send()
            .await
            .context("failed to reach Notion")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("notion retrieve page error {}: {}", status, body));
        }

        res.json::<Page>().await.context("invalid Notion page JSON")
    }

    async fn update_page(&self, page_id: &str, properties: Map<String, Value>) -> Result<()> {
        debug!(%page_id, count = properties.len(), "updating Notion page properties");
        let res = self
            .http
            .patch(self.page_endpoint(page_id)?)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Notion-Version", &self.version)
            .json(&json!({ "properties": properties }))
            .send()
            .await
            .context("failed to reach Notion")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("notion update page error {}: {}", status, body));
        }

        Ok(())
    }
}
