use async_trait::async_trait;
use time::OffsetDateTime;

use super::{PostgresRepositories, map_sqlx_error};
use crate::application::repos::{CreatePostParams, PostsRepo, PostsWriteRepo, RepoError};
use crate::domain::entities::PostRecord;

const POST_COLUMNS: &str = "id, content, posted_by, tracking_cookie, created_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    content: String,
    posted_by: Option<String>,
    tracking_cookie: Option<String>,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            posted_by: row.posted_by,
            tracking_cookie: row.tracking_cookie,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_posts(&self) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY id DESC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }

    async fn ping(&self) -> Result<(), RepoError> {
        self.health_check().await.map_err(map_sqlx_error)
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            content,
            posted_by,
            tracking_cookie,
        } = params;

        let sql = format!(
            "INSERT INTO posts (content, posted_by, tracking_cookie, created_at) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {POST_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(content)
            .bind(posted_by)
            .bind(tracking_cookie)
            .bind(OffsetDateTime::now_utc())
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(PostRecord::from(row))
    }

    async fn delete_post(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
