//! Webhook service that fills a Notion movie page with OMDb metadata.
//!
//! One POST request drives the whole pipeline: read the page title from
//! Notion, look the movie up on OMDb, derive the summary/feature/date text,
//! and write the results back to the page's properties.

pub mod config;
pub mod error;
pub mod handlers;
pub mod notion;
pub mod omdb;
pub mod text;
