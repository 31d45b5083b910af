use thiserror::Error;

/// Failure kinds the sync pipeline can produce on its own. Transport and
/// permission failures from Notion or OMDb stay as `anyhow` errors with
/// context; every kind collapses to a plain 500 message at the HTTP boundary.
#[derive(Debug, Error)]
pub enum Error {
    #[error("page_id missing: provide it in the JSON body or the X-Notion-Page-Id header")]
    MissingIdentifier,
    #[error("page title is empty")]
    EmptyTitle,
    #[error("OMDB_API_KEY is not set")]
    MissingCredential,
    #[error("{0}")]
    ProviderNotFound(String),
}
