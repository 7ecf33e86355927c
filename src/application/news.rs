use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::images::{ImageError, ImageReconciler, ImageUpload};
use crate::application::repos::{NewsParams, NewsRepo, RepoError};
use crate::domain::entities::NewsRecord;
use crate::domain::error::DomainError;
use crate::domain::fields::{optional_text, required_text};

#[derive(Debug, Error)]
pub enum NewsError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("news post not found")]
    NotFound,
    #[error(transparent)]
    Images(#[from] ImageError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct NewsCommand {
    pub title: String,
    pub preview: Option<String>,
    pub description: String,
    /// Stored verbatim; dates in the past are allowed.
    pub posted_at: OffsetDateTime,
    pub kept_images: Vec<String>,
    pub uploads: Vec<ImageUpload>,
}

#[derive(Clone)]
pub struct NewsService {
    news: Arc<dyn NewsRepo>,
    images: ImageReconciler,
}

impl NewsService {
    pub fn new(news: Arc<dyn NewsRepo>, images: ImageReconciler) -> Self {
        Self { news, images }
    }

    pub async fn list(&self) -> Result<Vec<NewsRecord>, NewsError> {
        self.news.list_news().await.map_err(NewsError::from)
    }

    pub async fn get(&self, id: i32) -> Result<NewsRecord, NewsError> {
        self.news.find_news(id).await?.ok_or(NewsError::NotFound)
    }

    pub async fn create(&self, command: NewsCommand) -> Result<NewsRecord, NewsError> {
        let NewsCommand {
            title,
            preview,
            description,
            posted_at,
            kept_images,
            uploads,
        } = command;
        let title = required_text("title", &title)?;

        let images = self.images.reconcile(&[], kept_images, uploads).await?;
        let params = NewsParams {
            title,
            preview: optional_text(preview.as_deref()),
            description,
            image_urls: images.urls,
            posted_at,
            timestamp: OffsetDateTime::now_utc(),
        };

        match self.news.create_news(params).await {
            Ok(news) => {
                info!(news_id = news.id, "Created news post");
                Ok(news)
            }
            Err(err) => {
                self.images.discard(&images.stored).await;
                Err(err.into())
            }
        }
    }

    pub async fn update(&self, id: i32, command: NewsCommand) -> Result<NewsRecord, NewsError> {
        let NewsCommand {
            title,
            preview,
            description,
            posted_at,
            kept_images,
            uploads,
        } = command;
        let title = required_text("title", &title)?;
        self.images.validate(&uploads)?;

        let current = self.get(id).await?;
        let images = self
            .images
            .reconcile(&current.image_urls, kept_images, uploads)
            .await?;
        let params = NewsParams {
            title,
            preview: optional_text(preview.as_deref()),
            description,
            image_urls: images.urls,
            posted_at,
            timestamp: OffsetDateTime::now_utc(),
        };

        match self.news.update_news(id, params).await {
            Ok(news) => {
                info!(
                    news_id = news.id,
                    removed_images = images.deleted.len(),
                    "Updated news post"
                );
                Ok(news)
            }
            Err(err) => {
                self.images.discard(&images.stored).await;
                Err(match err {
                    RepoError::NotFound => NewsError::NotFound,
                    other => other.into(),
                })
            }
        }
    }

    pub async fn delete(&self, id: i32) -> Result<NewsRecord, NewsError> {
        let news = self.get(id).await?;
        self.images.remove_all(&news.image_urls).await?;
        self.news.delete_news(id).await.map_err(|err| match err {
            RepoError::NotFound => NewsError::NotFound,
            other => other.into(),
        })?;
        info!(news_id = id, "Deleted news post");
        Ok(news)
    }
}
