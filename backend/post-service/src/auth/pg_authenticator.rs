use super::password::{hash_password, verify_password_blocking};
use super::{Authenticator, AuthorIdentity, Credentials, LOGIN_FAILED};
use crate::error::{AppError, Result};
use crate::models::Author;
use sqlx::{PgPool, Row};
use tracing::{debug, info};

/// Authenticator reading the `authors` table
#[derive(Clone)]
pub struct PgAuthenticator {
    pool: PgPool,
}

impl PgAuthenticator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Provision an active author with a password (operator tooling)
    pub async fn create_author(&self, name: &str, email: &str, password: &str) -> Result<Author> {
        let name = name.trim();
        if name.is_empty() || email.trim().is_empty() {
            return Err(AppError::ValidationError(
                "name, email, and password are required".into(),
            ));
        }

        let password_hash = hash_password(password)?;

        let author = sqlx::query_as::<_, Author>(
            r#"
            INSERT INTO authors (name, email, password_hash, is_active)
            VALUES ($1, $2, $3, TRUE)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .bind(email.trim())
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.is_unique_violation() {
                    return AppError::Conflict(format!("author '{}' already exists", name));
                }
            }
            AppError::from(err)
        })?;

        info!(author_id = author.id, name = %author.name, "created author");
        Ok(author)
    }
}

#[async_trait::async_trait]
impl Authenticator for PgAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthorIdentity> {
        let row = sqlx::query(
            r#"
            SELECT id, name, password_hash
            FROM authors
            WHERE name = $1 AND is_active AND password_hash IS NOT NULL
            "#,
        )
        .bind(&credentials.username)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            debug!(username = %credentials.username, "login failed: unknown or inactive author");
            return Err(AppError::Unauthorized(LOGIN_FAILED.into()));
        };

        let password_hash: String = row.try_get("password_hash")?;
        if !verify_password_blocking(credentials.password.clone(), password_hash).await? {
            debug!(username = %credentials.username, "login failed: password mismatch");
            return Err(AppError::Unauthorized(LOGIN_FAILED.into()));
        }

        Ok(AuthorIdentity {
            author_id: row.try_get("id")?,
            name: row.try_get("name")?,
        })
    }
}
