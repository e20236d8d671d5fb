use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::models::{Author, Post};
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct Inner {
    /// Posts in append order; ids are strictly increasing along the vector.
    posts: Vec<Post>,
    authors: HashMap<i64, Author>,
    last_post_id: i64,
    last_author_id: i64,
}

impl Inner {
    fn newest_first(&self, filter: impl Fn(&Post) -> bool, limit: usize) -> Vec<Post> {
        self.posts
            .iter()
            .rev()
            .filter(|post| filter(*post))
            .take(limit)
            .cloned()
            .collect()
    }
}

/// Process-local post store.
///
/// A single `RwLock` guards both the id counter and the post log, so id
/// assignment and visibility happen in the same critical section.
#[derive(Default)]
pub struct InMemoryPostStore {
    inner: RwLock<Inner>,
}

impl InMemoryPostStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new author. Names must be unique.
    pub async fn create_author(&self, name: &str) -> Result<Author> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("author name is required".into()));
        }

        let mut inner = self.inner.write().await;
        if inner.authors.values().any(|author| author.name == name) {
            return Err(AppError::Conflict(format!("author '{}' already exists", name)));
        }

        inner.last_author_id += 1;
        let author = Author {
            id: inner.last_author_id,
            name: name.to_string(),
        };
        inner.authors.insert(author.id, author.clone());

        debug!(author_id = author.id, name = %author.name, "registered author");
        Ok(author)
    }
}

#[async_trait::async_trait]
impl PostStore for InMemoryPostStore {
    async fn append(&self, author_id: i64, body: &str) -> Result<Post> {
        if body.is_empty() {
            return Err(AppError::ValidationError("post body is empty".into()));
        }

        let mut inner = self.inner.write().await;
        let author = inner
            .authors
            .get(&author_id)
            .map(|author| author.name.clone())
            .ok_or_else(|| AppError::NotFound(format!("author {}", author_id)))?;

        inner.last_post_id += 1;
        let post = Post {
            id: inner.last_post_id,
            author_id,
            author,
            body: body.to_string(),
            created_at: Utc::now(),
        };
        inner.posts.push(post.clone());

        Ok(post)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        Ok(inner.newest_first(|_| true, limit))
    }

    async fn by_author(&self, author_id: i64, limit: usize) -> Result<Vec<Post>> {
        let inner = self.inner.read().await;
        Ok(inner.newest_first(move |post| post.author_id == author_id, limit))
    }

    async fn search(&self, needle: &str, limit: usize) -> Result<Vec<Post>> {
        let needle = needle.to_lowercase();
        let inner = self.inner.read().await;
        Ok(inner.newest_first(move |post| post.body.to_lowercase().contains(&needle), limit))
    }

    async fn first_by_author(&self, author_id: i64) -> Result<Option<Post>> {
        let inner = self.inner.read().await;
        Ok(inner
            .posts
            .iter()
            .rev()
            .find(|post| post.author_id == author_id)
            .cloned())
    }

    async fn author_by_name(&self, name: &str) -> Result<Option<Author>> {
        let inner = self.inner.read().await;
        Ok(inner
            .authors
            .values()
            .find(|author| author.name == name)
            .cloned())
    }
}
