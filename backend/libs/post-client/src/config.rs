//! Client configuration

use crate::error::{ClientError, Result};
use std::fmt;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Clone)]
pub struct ClientConfig {
    /// Service root, e.g. `http://127.0.0.1:8080`
    pub base_url: String,
    pub username: String,
    pub password: String,
    /// Delay between poll attempts
    pub poll_interval: Duration,
    /// Per-request timeout
    pub request_timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            request_timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Load from `POST_SERVICE_URL`, `POST_CLIENT_USERNAME`,
    /// `POST_CLIENT_PASSWORD`, `POST_CLIENT_POLL_INTERVAL_MS` and
    /// `POST_CLIENT_REQUEST_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self> {
        let base_url =
            std::env::var("POST_SERVICE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let username = required_env("POST_CLIENT_USERNAME")?;
        let password = required_env("POST_CLIENT_PASSWORD")?;

        let poll_interval = millis_env("POST_CLIENT_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL_MS)?;
        let request_timeout =
            millis_env("POST_CLIENT_REQUEST_TIMEOUT_MS", DEFAULT_REQUEST_TIMEOUT_MS)?;
        if request_timeout.is_zero() {
            return Err(ClientError::InvalidArgument(
                "POST_CLIENT_REQUEST_TIMEOUT_MS must be greater than 0".into(),
            ));
        }

        Ok(Self {
            base_url,
            username,
            password,
            poll_interval,
            request_timeout,
        })
    }

    /// Absolute URL for an API path such as `/api/v1/posts`
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

fn required_env(key: &str) -> Result<String> {
    match std::env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ClientError::InvalidArgument(format!("{} must be set", key))),
    }
}

fn millis_env(key: &str, default: u64) -> Result<Duration> {
    let millis = match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<u64>().map_err(|e| {
            ClientError::InvalidArgument(format!("{} has invalid value '{}': {}", key, raw, e))
        })?,
        Err(_) => default,
    };
    Ok(Duration::from_millis(millis))
}
