use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dotenv::dotenv;
use tracing::info;

use moviebot::config::Config;
use moviebot::handlers::{router, AppState};
use moviebot::notion::NotionClient;
use moviebot::omdb::OmdbClient;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Override the PORT environment variable
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(port) = args.port {
        config.port = port;
    }

    let notion = Arc::new(NotionClient::new(
        config.notion_token.clone(),
        config.notion_version.clone(),
    ));
    let movies = Arc::new(OmdbClient::new(config.omdb_api_key.clone()));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let state = Arc::new(AppState {
        config,
        notion,
        movies,
    });

    info!("starting webhook server on {}", addr);
    axum::Server::bind(&addr)
        .serve(router(state).into_make_service())
        .await
        .context("error while running webhook server")?;

    Ok(())
}
