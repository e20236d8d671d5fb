//! Post client
//!
//! HTTP client for post-service plus the polling protocol that waits for an
//! author's next post.
//!
//! ```no_run
//! use post_client::{ClientConfig, FeedClient};
//!
//! # async fn run() -> Result<(), post_client::ClientError> {
//! let client = FeedClient::new(ClientConfig::from_env()?)?;
//! if let Some(body) = client.read_from_user("foo", 5).await? {
//!     println!("foo says: {}", body);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod poll;

pub use client::FeedClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use models::PostRecord;
pub use poll::{LatestPostSource, PollOutcome, Poller};
