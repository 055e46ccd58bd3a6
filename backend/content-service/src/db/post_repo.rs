use super::PostStore;
use crate::models::{Comment, Post};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use error_types::Result;
use resilience::with_timeout;
use sqlx::types::Json;
use sqlx::PgPool;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// PostgreSQL post store
///
/// Likes live in a `uuid[]` column and the comment tree in `jsonb`, so one
/// `UPDATE ... WHERE version = $n` swaps the whole aggregate atomically.
#[derive(Clone)]
pub struct PgPostStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgPostStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    author_id: Uuid,
    caption: Option<String>,
    media_ref: Option<String>,
    likes: Vec<Uuid>,
    comments: Json<Vec<Comment>>,
    created_at: DateTime<Utc>,
    version: i64,
}

impl From<PostRow> for Post {
    fn from(row: PostRow) -> Self {
        Post {
            id: row.id,
            author_id: row.author_id,
            caption: row.caption,
            media_ref: row.media_ref,
            likes: row.likes.into_iter().collect(),
            comments: row.comments.0,
            created_at: row.created_at,
            version: row.version,
        }
    }
}

const POST_COLUMNS: &str =
    "id, author_id, caption, media_ref, likes, comments, created_at, version";

#[async_trait]
impl PostStore for PgPostStore {
    async fn insert(&self, post: &Post) -> Result<()> {
        let likes: Vec<Uuid> = post.likes.iter().copied().collect();
        with_timeout(
            self.timeout,
            sqlx::query(
                r#"
                INSERT INTO posts (id, author_id, caption, media_ref, likes, comments, created_at, version)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(post.id)
            .bind(post.author_id)
            .bind(&post.caption)
            .bind(&post.media_ref)
            .bind(&likes)
            .bind(Json(&post.comments))
            .bind(post.created_at)
            .bind(post.version)
            .execute(&self.pool),
        )
        .await??;

        debug!(post_id = %post.id, author_id = %post.author_id, "Inserted post");
        Ok(())
    }

    async fn find(&self, post_id: Uuid) -> Result<Option<Post>> {
        let row = with_timeout(
            self.timeout,
            sqlx::query_as::<_, PostRow>(&format!(
                "SELECT {POST_COLUMNS} FROM posts WHERE id = $1"
            ))
            .bind(post_id)
            .fetch_optional(&self.pool),
        )
        .await??;

        Ok(row.map(Post::from))
    }

    async fn find_by_authors(&self, author_ids: &[Uuid]) -> Result<Vec<Post>> {
        if author_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = with_timeout(
            self.timeout,
            sqlx::query_as::<_, PostRow>(&format!(
                "SELECT {POST_COLUMNS} FROM posts WHERE author_id = ANY($1) ORDER BY created_at DESC"
            ))
            .bind(author_ids)
            .fetch_all(&self.pool),
        )
        .await??;

        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn replace_if_version(&self, post: &Post, expected_version: i64) -> Result<bool> {
        let likes: Vec<Uuid> = post.likes.iter().copied().collect();
        let result = with_timeout(
            self.timeout,
            sqlx::query(
                r#"
                UPDATE posts
                SET caption = $2, media_ref = $3, likes = $4, comments = $5, version = $6
                WHERE id = $1 AND version = $7
                "#,
            )
            .bind(post.id)
            .bind(&post.caption)
            .bind(&post.media_ref)
            .bind(&likes)
            .bind(Json(&post.comments))
            .bind(post.version)
            .bind(expected_version)
            .execute(&self.pool),
        )
        .await??;

        let swapped = result.rows_affected() == 1;
        debug!(post_id = %post.id, expected_version, swapped, "Compare-and-swap post");
        Ok(swapped)
    }

    async fn health_check(&self) -> Result<()> {
        with_timeout(self.timeout, sqlx::query("SELECT 1").execute(&self.pool)).await??;
        Ok(())
    }
}
