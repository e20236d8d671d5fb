//! Wire types returned by post-service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A post as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub author_id: i64,
    pub author: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostsEnvelope {
    pub posts: Vec<PostRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreatePostBody<'a> {
    pub post: &'a str,
}
