/// Post Service Library
///
/// Minimal authenticated microblogging backend: authors submit short text
/// posts and read newest-first feeds. Post identifiers are assigned by the
/// store in strictly increasing order, which is what lets clients poll for
/// "newer than what I have seen".
///
/// # Modules
///
/// - `db`: post store trait with Postgres and in-memory implementations
/// - `services`: feed query engine and ingestion path
/// - `auth`: authenticator collaborator and password hashing
/// - `middleware`: credential resolution for HTTP requests
/// - `handlers`: HTTP endpoints and route table
/// - `models`: posts, authors, request/response bodies
/// - `error`: error types and HTTP mapping
/// - `config`: configuration management
/// - `metrics`: Prometheus collectors
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use db::PostStore;
use services::{FeedService, IngestionService};
use std::sync::Arc;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PostStore>,
    pub feed: FeedService,
    pub ingestion: IngestionService,
}

impl AppState {
    pub fn new(store: Arc<dyn PostStore>, feed_window: usize, max_body_chars: usize) -> Self {
        Self {
            feed: FeedService::new(store.clone(), feed_window),
            ingestion: IngestionService::new(store.clone(), max_body_chars),
            store,
        }
    }

    pub fn from_config(store: Arc<dyn PostStore>, config: &Config) -> Self {
        Self::new(store, config.feed.window, config.feed.max_body_chars)
    }
}
