use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{NewsParams, NewsRepo, RepoError},
    domain::entities::NewsRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const NEWS_COLUMNS: &str =
    "id, title, preview, description, image_urls, created_at, updated_at, posted_at";

#[derive(sqlx::FromRow)]
struct NewsRow {
    id: i32,
    title: String,
    preview: Option<String>,
    description: String,
    image_urls: Vec<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
    posted_at: OffsetDateTime,
}

impl From<NewsRow> for NewsRecord {
    fn from(row: NewsRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            preview: row.preview,
            description: row.description,
            image_urls: row.image_urls,
            created_at: row.created_at,
            updated_at: row.updated_at,
            posted_at: row.posted_at,
        }
    }
}

#[async_trait]
impl NewsRepo for PostgresRepositories {
    async fn create_news(&self, params: NewsParams) -> Result<NewsRecord, RepoError> {
        let sql = format!(
            "INSERT INTO news (title, preview, description, image_urls, created_at, updated_at, posted_at) \
             VALUES ($1, $2, $3, $4, $5, $5, $6) \
             RETURNING {NEWS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(params.title)
            .bind(params.preview)
            .bind(params.description)
            .bind(params.image_urls)
            .bind(params.timestamp)
            .bind(params.posted_at)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_news(&self, id: i32) -> Result<Option<NewsRecord>, RepoError> {
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news WHERE id = $1");
        let row = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(NewsRecord::from))
    }

    async fn list_news(&self) -> Result<Vec<NewsRecord>, RepoError> {
        let sql = format!("SELECT {NEWS_COLUMNS} FROM news ORDER BY posted_at DESC, id DESC");
        let rows = sqlx::query_as::<_, NewsRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(NewsRecord::from).collect())
    }

    async fn update_news(&self, id: i32, params: NewsParams) -> Result<NewsRecord, RepoError> {
        let sql = format!(
            "UPDATE news \
             SET title = $2, preview = $3, description = $4, image_urls = $5, \
                 updated_at = $6, posted_at = $7 \
             WHERE id = $1 \
             RETURNING {NEWS_COLUMNS}"
        );
        let row = sqlx::query_as::<_, NewsRow>(&sql)
            .bind(id)
            .bind(params.title)
            .bind(params.preview)
            .bind(params.description)
            .bind(params.image_urls)
            .bind(params.timestamp)
            .bind(params.posted_at)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(NewsRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_news(&self, id: i32) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
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
