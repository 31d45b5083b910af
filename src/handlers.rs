//! The webhook request handler: one inbound POST drives the whole
//! read → fetch → transform → write pipeline, strictly in sequence.

use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info, instrument};

use crate::config::Config;
use crate::error::Error;
use crate::notion::{self, NotionService};
use crate::omdb::MetadataService;
use crate::text;

pub const PAGE_ID_HEADER: &str = "X-Notion-Page-Id";

/// Immutable per-process state: configuration plus the two injected clients.
pub struct AppState {
    pub config: Config,
    pub notion: Arc<dyn NotionService>,
    pub movies: Arc<dyn MetadataService>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/wh/movie-sync", post(handler))
        .route("/healthcheck", get(|| async { "Ok" }))
        .with_state(state)
}

/// Every failure kind collapses to a 500 with a bare message; the first
/// error anywhere in the pipeline aborts the rest of it.
#[instrument(skip_all)]
pub async fn handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    match sync_page(&state, &headers, &body).await {
        Ok((title, updated)) => {
            info!(%title, "page updated");
            (
                StatusCode::OK,
                Json(json!({ "ok": true, "title": title, "updated": updated })),
            )
        }
        Err(err) => {
            error!(?err, "movie sync failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": format!("{err:#}") })),
            )
        }
    }
}

async fn sync_page(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(String, Vec<String>)> {
    // A malformed body is not fatal; only a missing identifier is.
    let payload: Value = serde_json::from_slice(body).unwrap_or_else(|_| json!({}));
    let page_id = resolve_page_id(&payload, headers)?;

    let page = state.notion.retrieve_page(&page_id).await?;
    let title = page.title(&state.config.title_property);
    if title.is_empty() {
        return Err(Error::EmptyTitle.into());
    }

    let meta = state.movies.fetch_by_title(&title).await?;

    let summary = text::summarize_plot(&meta.plot);
    let features = text::synthesize_features(&meta.director, &meta.genres);
    let release_date = text::parse_released_to_iso(&meta.released);

    let properties = notion::build_properties(
        &meta,
        &summary,
        &features,
        release_date.as_deref(),
        page.supports_status(),
    );
    let updated: Vec<String> = properties.keys().cloned().collect();
    state.notion.update_page(&page_id, properties).await?;

    Ok((title, updated))
}

/// Body field wins when non-empty; the header fallback is trimmed first.
fn resolve_page_id(payload: &Value, headers: &HeaderMap) -> Result<String> {
    if let Some(id) = payload.get("page_id").and_then(Value::as_str) {
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }
    if let Some(id) = headers.get(PAGE_ID_HEADER).and_then(|v| v.to_str().ok()) {
        let id = id.trim();
        if !id.is_empty() {
            return Ok(id.to_string());
        }
    }
    Err(Error::MissingIdentifier.into())
}
