//! HTTP client for post-service

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::models::{CreatePostBody, ErrorBody, PostRecord, PostsEnvelope};
use crate::poll::{LatestPostSource, PollOutcome, Poller};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info};

/// Authenticated client for the post-service feed API.
///
/// Every request carries the configured credentials as HTTP Basic auth.
pub struct FeedClient {
    client: Client,
    config: ClientConfig,
}

impl FeedClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        if config.base_url.trim().is_empty() {
            return Err(ClientError::InvalidArgument("base_url is required".into()));
        }
        if config.username.is_empty() || config.password.is_empty() {
            return Err(ClientError::InvalidArgument(
                "username and password are required".into(),
            ));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Publish a post as the configured user.
    ///
    /// Returns the bodies echoed by the service, which is the created post.
    pub async fn submit(&self, text: &str) -> Result<Vec<String>> {
        let request = self
            .client
            .post(self.config.url("/api/v1/posts"))
            .json(&CreatePostBody { post: text });

        let post: PostRecord = self.send(request).await?;
        info!(post_id = post.id, author = %post.author, "post submitted");

        Ok(vec![post.body])
    }

    /// Bodies of the most recent posts from everyone, newest first
    pub async fn list_recent(&self) -> Result<Vec<String>> {
        let request = self.client.get(self.config.url("/api/v1/posts/recent"));
        let envelope: PostsEnvelope = self.send(request).await?;

        Ok(envelope.posts.into_iter().map(|post| post.body).collect())
    }

    /// Block until `author` publishes something new, or `timeout_secs` runs out.
    pub async fn read_from_user(&self, author: &str, timeout_secs: u64) -> Result<Option<String>> {
        let (_cancel_tx, cancel_rx) = watch::channel(false);
        let outcome = self
            .poll_for_new_post(author, timeout_secs, cancel_rx)
            .await?;

        Ok(outcome.into_post().map(|post| post.body))
    }

    pub async fn poll_for_new_post(
        &self,
        author: &str,
        timeout_secs: u64,
        cancel: watch::Receiver<bool>,
    ) -> Result<PollOutcome> {
        if author.trim().is_empty() {
            return Err(ClientError::InvalidArgument("author is required".into()));
        }

        Poller::new(self, self.config.poll_interval)
            .wait_for_new_post(author, timeout_secs, cancel)
            .await
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        decode(response).await
    }
}

#[async_trait]
impl LatestPostSource for FeedClient {
    async fn latest_by_author(&self, author: &str) -> Result<Option<PostRecord>> {
        if author.trim().is_empty() {
            return Err(ClientError::InvalidArgument("author is required".into()));
        }

        let request = self
            .client
            .get(self.config.url("/api/v1/posts/by-author/latest"))
            .query(&[("author", author)]);
        let envelope: PostsEnvelope = self.send(request).await?;
        let latest = envelope.posts.into_iter().next();
        debug!(author, post_id = latest.as_ref().map(|post| post.id), "fetched latest post");

        Ok(latest)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();

    if status.is_success() {
        let bytes = response.bytes().await?;
        return serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()));
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };

    Err(classify(status, message))
}

fn classify(status: StatusCode, message: String) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        s if s.is_client_error() => ClientError::Rejected {
            status: s.as_u16(),
            message,
        },
        s => ClientError::Transport(format!("{}: {}", s, message)),
    }
}
