/// Ingestion path - authenticated, validated post submission
use crate::auth::AuthorIdentity;
use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::metrics::POSTS_CREATED_TOTAL;
use crate::models::Post;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn PostStore>,
    max_body_chars: usize,
}

impl IngestionService {
    pub fn new(store: Arc<dyn PostStore>, max_body_chars: usize) -> Self {
        Self {
            store,
            max_body_chars,
        }
    }

    /// Append a post for an already-authenticated author.
    ///
    /// Returns the persisted post including its store-assigned id, so callers
    /// can use it as a polling baseline without another read.
    pub async fn submit(&self, identity: Option<&AuthorIdentity>, body: &str) -> Result<Post> {
        let identity =
            identity.ok_or_else(|| AppError::Unauthorized("identity required".into()))?;

        if body.trim().is_empty() {
            return Err(AppError::ValidationError("post is required".into()));
        }

        let length = body.chars().count();
        if length > self.max_body_chars {
            return Err(AppError::ValidationError(format!(
                "post is {} characters; the limit is {}",
                length, self.max_body_chars
            )));
        }

        let post = self.store.append(identity.author_id, body).await?;
        POSTS_CREATED_TOTAL.inc();

        info!(post_id = post.id, author_id = post.author_id, "post created");
        Ok(post)
    }
}
