/// Feed query engine - read views over the post store
use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::metrics::{FEED_QUERY_DURATION_SECONDS, FEED_QUERY_TOTAL};
use crate::models::Post;
use std::sync::Arc;
use tracing::debug;

/// Stateless composition over a `PostStore`.
///
/// Every query is capped at the configured window and returned newest-first
/// whatever order the store hands back.
#[derive(Clone)]
pub struct FeedService {
    store: Arc<dyn PostStore>,
    window: usize,
}

impl FeedService {
    pub fn new(store: Arc<dyn PostStore>, window: usize) -> Self {
        Self {
            store,
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Most recent posts from everyone
    pub async fn recent(&self, limit: Option<usize>) -> Result<Vec<Post>> {
        let limit = self.clamp(limit);
        let _timer = Self::observe("recent");
        let posts = self.store.recent(limit).await?;
        Ok(finish(posts, limit))
    }

    /// Most recent posts whose body contains `query` (case-insensitive)
    pub async fn search(&self, query: Option<&str>, limit: Option<usize>) -> Result<Vec<Post>> {
        let query = required_param(query, "q")?;
        let limit = self.clamp(limit);
        let _timer = Self::observe("search");

        let posts = self.store.search(query, limit).await?;
        debug!(query, found = posts.len(), "search feed");
        Ok(finish(posts, limit))
    }

    /// Most recent posts by the named author; unknown authors have an empty feed
    pub async fn by_author(&self, author: Option<&str>, limit: Option<usize>) -> Result<Vec<Post>> {
        let author = required_param(author, "author")?;
        let limit = self.clamp(limit);
        let _timer = Self::observe("by_author");

        let Some(author) = self.store.author_by_name(author).await? else {
            debug!(author, "by-author feed for unknown author");
            return Ok(Vec::new());
        };

        let posts = self.store.by_author(author.id, limit).await?;
        Ok(finish(posts, limit))
    }

    /// Newest post of the named author, if the author exists and has posted
    pub async fn latest_by_author(&self, author: Option<&str>) -> Result<Option<Post>> {
        let author = required_param(author, "author")?;
        let _timer = Self::observe("latest");

        match self.store.author_by_name(author).await? {
            Some(author) => self.store.first_by_author(author.id).await,
            None => Ok(None),
        }
    }

    /// Requested limit capped at the window; 0 reads as 1
    fn clamp(&self, requested: Option<usize>) -> usize {
        requested.map_or(self.window, |limit| limit.clamp(1, self.window))
    }

    fn observe(kind: &str) -> prometheus::HistogramTimer {
        FEED_QUERY_TOTAL.with_label_values(&[kind]).inc();
        FEED_QUERY_DURATION_SECONDS
            .with_label_values(&[kind])
            .start_timer()
    }

}

fn finish(mut posts: Vec<Post>, limit: usize) -> Vec<Post> {
    posts.sort_unstable_by(|a, b| b.id.cmp(&a.id));
    posts.truncate(limit);
    posts
}

fn required_param<'a>(value: Option<&'a str>, name: &str) -> Result<&'a str> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::ValidationError(format!("{} is required", name))),
    }
}
