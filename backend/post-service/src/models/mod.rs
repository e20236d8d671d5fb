/// Data models for post-service
///
/// - Author: a registered poster with a unique display name
/// - Post: an immutable text post, ordered by its store-assigned id
/// - Request/response bodies for the HTTP surface
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of posts returned by any feed query.
pub const FEED_WINDOW: usize = 100;

/// Post author. Names are unique and never change once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub name: String,
}

/// A persisted post.
///
/// `id` is assigned by the store at append time and is the only ordering
/// key: a post appended later always has a larger id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    /// Display name of the author, joined at read time
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

/// `{ "posts": [...] }` wrapper shared by every feed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}

impl From<Vec<Post>> for PostsResponse {
    fn from(posts: Vec<Post>) -> Self {
        Self { posts }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    #[serde(default)]
    pub post: Option<String>,
}

/// Optional `limit` on feed reads, capped at the configured window
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct AuthorParams {
    pub author: Option<String>,
    pub limit: Option<usize>,
}
