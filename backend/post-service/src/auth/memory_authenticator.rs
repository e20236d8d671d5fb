use super::password::{hash_password, verify_password_blocking};
use super::{Authenticator, AuthorIdentity, Credentials, LOGIN_FAILED};
use crate::error::{AppError, Result};
use crate::models::Author;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Authenticator backed by a process-local credential table.
#[derive(Default)]
pub struct InMemoryAuthenticator {
    accounts: RwLock<HashMap<String, (AuthorIdentity, String)>>,
}

impl InMemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a password to an existing author
    pub async fn add_account(&self, author: &Author, password: &str) -> Result<()> {
        let hash = hash_password(password)?;
        let identity = AuthorIdentity {
            author_id: author.id,
            name: author.name.clone(),
        };

        self.accounts
            .write()
            .await
            .insert(author.name.clone(), (identity, hash));
        Ok(())
    }
}

#[async_trait::async_trait]
impl Authenticator for InMemoryAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthorIdentity> {
        let account = self
            .accounts
            .read()
            .await
            .get(&credentials.username)
            .cloned();

        let Some((identity, hash)) = account else {
            return Err(AppError::Unauthorized(LOGIN_FAILED.into()));
        };

        if verify_password_blocking(credentials.password.clone(), hash).await? {
            Ok(identity)
        } else {
            Err(AppError::Unauthorized(LOGIN_FAILED.into()))
        }
    }
}
