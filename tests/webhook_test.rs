use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use moviebot::config::Config;
use moviebot::error::Error;
use moviebot::handlers::{router, AppState};
use moviebot::notion::{NotionService, Page};
use moviebot::omdb::{MetadataService, MovieMetadata};

fn test_config() -> Config {
    Config {
        notion_token: "secret".to_string(),
        notion_version: "2022-06-28".to_string(),
        omdb_api_key: Some("omdb-key".to_string()),
        title_property: "이름".to_string(),
        port: 0,
    }
}

fn page_from(properties: Value) -> Page {
    serde_json::from_value(json!({ "properties": properties })).unwrap()
}

fn page_with_title(title: &str) -> Page {
    page_from(json!({
        "이름": { "type": "title", "title": [{ "plain_text": title }] }
    }))
}

#[derive(Clone)]
struct FakeNotion {
    page: Option<Page>,
    retrieved: Arc<Mutex<Vec<String>>>,
    updates: Arc<Mutex<Vec<(String, Map<String, Value>)>>>,
}

impl FakeNotion {
    fn with_page(page: Page) -> Self {
        Self {
            page: Some(page),
            retrieved: Arc::new(Mutex::new(Vec::new())),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn updates(&self) -> Vec<(String, Map<String, Value>)> {
        self.updates.lock().unwrap().clone()
    }

    fn retrieved(&self) -> Vec<String> {
        self.retrieved.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotionService for FakeNotion {
    async fn retrieve_page(&self, page_id: &str) -> Result<Page> {
        self.retrieved.lock().unwrap().push(page_id.to_string());
        self.page
            .clone()
            .ok_or_else(|| anyhow!("notion retrieve page error 404: page not found"))
    }

    async fn update_page(&self, page_id: &str, properties: Map<String, Value>) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((page_id.to_string(), properties));
        Ok(())
    }
}

#[derive(Clone)]
struct FakeMovies {
    metadata: MovieMetadata,
    not_found: Option<String>,
    titles: Arc<Mutex<Vec<String>>>,
}

impl FakeMovies {
    fn returning(metadata: MovieMetadata) -> Self {
        Self {
            metadata,
            not_found: None,
            titles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn not_found(message: &str) -> Self {
        Self {
            metadata: MovieMetadata::default(),
            not_found: Some(message.to_string()),
            titles: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn titles(&self) -> Vec<String> {
        self.titles.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataService for FakeMovies {
    async fn fetch_by_title(&self, title: &str) -> Result<MovieMetadata> {
        self.titles.lock().unwrap().push(title.to_string());
        if let Some(message) = &self.not_found {
            return Err(Error::ProviderNotFound(message.clone()).into());
        }
        Ok(self.metadata.clone())
    }
}

fn app(notion: FakeNotion, movies: FakeMovies) -> axum::Router {
    router(Arc::new(AppState {
        config: test_config(),
        notion: Arc::new(notion),
        movies: Arc::new(movies),
    }))
}

async fn post_webhook(
    app: axum::Router,
    body: &str,
    header: Option<&str>,
) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri("/wh/movie-sync")
        .header("content-type", "application/json");
    if let Some(id) = header {
        request = request.header("X-Notion-Page-Id", id);
    }
    let response = app
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn die_hard() -> MovieMetadata {
    MovieMetadata {
        director: "John McTiernan".to_string(),
        plot: "NYPD cop John McClane takes on a gang in a Los Angeles tower.".to_string(),
        genres: vec!["Action".to_string(), "Thriller".to_string()],
        released: "20 Jun 1988".to_string(),
        writer: "Jeb Stuart, Steven E. de Souza".to_string(),
        actors: "Bruce Willis, Alan Rickman".to_string(),
    }
}

#[tokio::test]
async fn updates_the_page_with_fetched_metadata() {
    let notion = FakeNotion::with_page(page_with_title("Die Hard"));
    let movies = FakeMovies::returning(die_hard());
    let (status, body) = post_webhook(
        app(notion.clone(), movies.clone()),
        r#"{"page_id":"abc123"}"#,
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(body["title"], json!("Die Hard"));

    assert_eq!(notion.retrieved(), vec!["abc123"]);
    assert_eq!(movies.titles(), vec!["Die Hard"]);

    let updates = notion.updates();
    assert_eq!(updates.len(), 1);
    let (page_id, properties) = &updates[0];
    assert_eq!(page_id, "abc123");

    // Genre order passes through untouched.
    assert_eq!(
        properties["장르"],
        json!({ "multi_select": [{ "name": "Action" }, { "name": "Thriller" }] })
    );
    assert_eq!(
        properties["개봉일"],
        json!({ "date": { "start": "1988-06-20" } })
    );
    // The page has no status property, so none is written.
    assert!(!properties.contains_key("상태"));

    let updated: Vec<&str> = body["updated"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(updated.len(), 6);
    for name in ["감독", "줄거리 요약", "특징", "장르", "개봉일", "제작진"] {
        assert!(updated.contains(&name), "missing {}", name);
    }
}

#[tokio::test]
async fn missing_identifier_is_a_500() {
    let notion = FakeNotion::with_page(page_with_title("Die Hard"));
    let movies = FakeMovies::returning(die_hard());
    let (status, body) = post_webhook(app(notion.clone(), movies), "{}", None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["ok"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("page_id"));
    assert!(notion.retrieved().is_empty());
}

#[tokio::test]
async fn header_supplies_the_page_id_even_with_a_malformed_body() {
    let notion = FakeNotion::with_page(page_with_title("Die Hard"));
    let movies = FakeMovies::returning(die_hard());
    let (status, body) = post_webhook(
        app(notion.clone(), movies),
        "this is not json",
        Some("  abc123  "),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], json!(true));
    assert_eq!(notion.retrieved(), vec!["abc123"]);
}

#[tokio::test]
async fn provider_not_found_reports_the_provider_message() {
    let notion = FakeNotion::with_page(page_with_title("Die Hard"));
    let movies = FakeMovies::not_found("Movie not found!");
    let (status, body) =
        post_webhook(app(notion.clone(), movies), r#"{"page_id":"abc123"}"#, None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Movie not found!"));
    assert!(notion.updates().is_empty());
}

#[tokio::test]
async fn empty_title_is_a_500() {
    let notion = FakeNotion::with_page(page_with_title("   "));
    let movies = FakeMovies::returning(die_hard());
    let (status, body) =
        post_webhook(app(notion.clone(), movies.clone()), r#"{"page_id":"abc123"}"#, None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("title"));
    assert!(movies.titles().is_empty());
}

#[tokio::test]
async fn status_is_written_when_the_page_supports_it() {
    let notion = FakeNotion::with_page(page_from(json!({
        "이름": { "type": "title", "title": [{ "plain_text": "Die Hard" }] },
        "상태": { "type": "status", "status": null }
    })));
    let movies = FakeMovies::returning(die_hard());
    let (status, body) =
        post_webhook(app(notion.clone(), movies), r#"{"page_id":"abc123"}"#, None).await;

    assert_eq!(status, StatusCode::OK);
    let (_, properties) = &notion.updates()[0];
    assert_eq!(properties["상태"], json!({ "status": { "name": "완료" } }));
    assert_eq!(body["updated"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn unparsable_release_date_is_omitted() {
    let notion = FakeNotion::with_page(page_with_title("Die Hard"));
    let mut meta = die_hard();
    meta.released = "N/A".to_string();
    let movies = FakeMovies::returning(meta);
    let (status, _) =
        post_webhook(app(notion.clone(), movies), r#"{"page_id":"abc123"}"#, None).await;

    assert_eq!(status, StatusCode::OK);
    let (_, properties) = &notion.updates()[0];
    assert!(!properties.contains_key("개봉일"));
}

#[tokio::test]
async fn notion_failure_propagates_as_a_500() {
    let notion = FakeNotion {
        page: None,
        retrieved: Arc::new(Mutex::new(Vec::new())),
        updates: Arc::new(Mutex::new(Vec::new())),
    };
    let movies = FakeMovies::returning(die_hard());
    let (status, body) =
        post_webhook(app(notion, movies), r#"{"page_id":"abc123"}"#, None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("404"));
}
