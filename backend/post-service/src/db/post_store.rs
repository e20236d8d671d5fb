use crate::error::Result;
use crate::models::{Author, Post};

/// Durable, order-preserving append log of posts.
///
/// Implementations must serialize identifier assignment: two concurrent
/// `append` calls never share an id, and once `append` returns the post is
/// visible to every later read together with every post carrying a smaller id.
/// All range reads return posts newest-first (descending id).
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    /// Append a post for `author_id`, assigning the next identifier.
    ///
    /// Fails with `ValidationError` on an empty body and `NotFound` when the
    /// author does not exist.
    async fn append(&self, author_id: i64, body: &str) -> Result<Post>;

    /// Most recent posts across all authors
    async fn recent(&self, limit: usize) -> Result<Vec<Post>>;

    /// Most recent posts of a single author
    async fn by_author(&self, author_id: i64, limit: usize) -> Result<Vec<Post>>;

    /// Most recent posts whose body contains `needle`, ignoring case
    async fn search(&self, needle: &str, limit: usize) -> Result<Vec<Post>>;

    /// The single newest post of an author, if any
    async fn first_by_author(&self, author_id: i64) -> Result<Option<Post>> {
        Ok(self.by_author(author_id, 1).await?.into_iter().next())
    }

    /// Resolve an author by display name
    async fn author_by_name(&self, name: &str) -> Result<Option<Author>>;

    /// Health check (optional)
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
