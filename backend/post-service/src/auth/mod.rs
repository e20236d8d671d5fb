/// Authentication collaborator
///
/// The post service never stores or checks credentials itself; it consumes
/// an `Authenticator` that turns credentials into an `AuthorIdentity`.
mod memory_authenticator;
pub mod password;
mod pg_authenticator;

pub use memory_authenticator::InMemoryAuthenticator;
pub use pg_authenticator::PgAuthenticator;

use crate::error::Result;
use std::fmt;

/// Resolved identity of the author making a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorIdentity {
    pub author_id: i64,
    pub name: String,
}

/// Username/password pair presented by a client.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Validates credentials and resolves the author behind them.
///
/// Unknown users, inactive users and wrong passwords all fail with
/// `AppError::Unauthorized` and the same message.
#[async_trait::async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthorIdentity>;
}

pub(crate) const LOGIN_FAILED: &str = "Login failed";
