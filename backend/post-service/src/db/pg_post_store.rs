use crate::db::PostStore;
use crate::error::{AppError, Result};
use crate::models::{Author, Post};
use sqlx::PgPool;
use tracing::debug;

/// Advisory lock key serializing post appends ("gobbler" in ASCII).
const POST_APPEND_LOCK_KEY: i64 = 0x0067_6f62_626c_6572;

/// PostgreSQL-backed post store (source of truth)
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
}

impl PgPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("migration failed: {}", e)))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Escape LIKE metacharacters so user input matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn limit_param(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl PostStore for PgPostStore {
    async fn append(&self, author_id: i64, body: &str) -> Result<Post> {
        if body.is_empty() {
            return Err(AppError::ValidationError("post body is empty".into()));
        }

        // The advisory lock is held until commit, so ids become visible in
        // the same order they are drawn from the sequence.
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(POST_APPEND_LOCK_KEY)
            .execute(&mut *tx)
            .await?;

        let post = sqlx::query_as::<_, Post>(
            r#"
            WITH inserted AS (
                INSERT INTO posts (author_id, body)
                VALUES ($1, $2)
                RETURNING id, author_id, body, created_at
            )
            SELECT i.id, i.author_id, a.name AS author, i.body, i.created_at
            FROM inserted i
            JOIN authors a ON a.id = i.author_id
            "#,
        )
        .bind(author_id)
        .bind(body)
        .fetch_one(&mut *tx)
        .await
        .map_err(|err| {
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.is_foreign_key_violation() {
                    return AppError::NotFound(format!("author {}", author_id));
                }
            }
            AppError::from(err)
        })?;

        tx.commit().await?;

        debug!(post_id = post.id, author_id, "appended post");
        Ok(post)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, a.name AS author, p.body, p.created_at
            FROM posts p
            JOIN authors a ON a.id = p.author_id
            ORDER BY p.id DESC
            LIMIT $1
            "#,
        )
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn by_author(&self, author_id: i64, limit: usize) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, a.name AS author, p.body, p.created_at
            FROM posts p
            JOIN authors a ON a.id = p.author_id
            WHERE p.author_id = $1
            ORDER BY p.id DESC
            LIMIT $2
            "#,
        )
        .bind(author_id)
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn search(&self, needle: &str, limit: usize) -> Result<Vec<Post>> {
        let pattern = format!("%{}%", escape_like(needle));

        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, a.name AS author, p.body, p.created_at
            FROM posts p
            JOIN authors a ON a.id = p.author_id
            WHERE p.body ILIKE $1
            ORDER BY p.id DESC
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(limit_param(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn first_by_author(&self, author_id: i64) -> Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.author_id, a.name AS author, p.body, p.created_at
            FROM posts p
            JOIN authors a ON a.id = p.author_id
            WHERE p.author_id = $1
            ORDER BY p.id DESC
            LIMIT 1
            "#,
        )
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(post)
    }

    async fn author_by_name(&self, name: &str) -> Result<Option<Author>> {
        let author = sqlx::query_as::<_, Author>("SELECT id, name FROM authors WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(author)
    }

    async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_like_escapes_metacharacters() {
        assert_eq!(escape_like("second"), "second");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }

    #[test]
    fn limit_param_saturates() {
        assert_eq!(limit_param(100), 100);
        assert_eq!(limit_param(usize::MAX), i64::MAX);
    }
}
