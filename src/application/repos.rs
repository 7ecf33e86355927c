//! Repository traits describing persistence adapters.

use async_trait::async_trait;
use thiserror::Error;
use time::OffsetDateTime;

use crate::domain::entities::{MenuCategoryRecord, MenuItemRecord, NewsRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("integrity error: {message}")]
    Integrity { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// Result of a get-or-create on the category table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryUpsert {
    pub id: i32,
    /// Slug stored on the row; for an existing row this is whatever it was
    /// created with, not a freshly derived one.
    pub name_en: String,
    pub created: bool,
}

/// Outcome of a conditional category delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryRemoval {
    Removed,
    InUse,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItemParams {
    pub title: String,
    pub price: i32,
    pub image_urls: Vec<String>,
    pub calories: Option<i32>,
    pub description: Option<String>,
    pub category: String,
    /// Written to `updated_at`, and to `created_at` on insert.
    pub timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsParams {
    pub title: String,
    pub preview: Option<String>,
    pub description: String,
    pub image_urls: Vec<String>,
    pub posted_at: OffsetDateTime,
    /// Written to `updated_at`, and to `created_at` on insert.
    pub timestamp: OffsetDateTime,
}

#[async_trait]
pub trait CategoriesRepo: Send + Sync {
    /// Insert the category unless `name_ru` already exists, appending it after
    /// the current highest sort order. Must be safe under concurrent calls.
    async fn upsert_category(&self, name_ru: &str, name_en: &str)
    -> Result<CategoryUpsert, RepoError>;

    /// All categories ordered by `(sort_order, name_ru)`.
    async fn list_categories(&self) -> Result<Vec<MenuCategoryRecord>, RepoError>;

    async fn find_category(&self, id: i32) -> Result<Option<MenuCategoryRecord>, RepoError>;

    /// Returns [`RepoError::NotFound`] when no row has `id`.
    async fn update_sort_order(&self, id: i32, sort_order: i32) -> Result<(), RepoError>;

    /// Delete the category with slug `name_en` when no menu item references it.
    async fn delete_category_if_unused(&self, name_en: &str)
    -> Result<CategoryRemoval, RepoError>;

    /// Returns [`RepoError::NotFound`] when no row has `id`.
    async fn delete_category(&self, id: i32) -> Result<(), RepoError>;
}

#[async_trait]
pub trait MenuRepo: Send + Sync {
    async fn create_item(&self, params: MenuItemParams) -> Result<MenuItemRecord, RepoError>;

    async fn find_item(&self, id: i32) -> Result<Option<MenuItemRecord>, RepoError>;

    async fn list_items(&self) -> Result<Vec<MenuItemRecord>, RepoError>;

    async fn list_items_in_category(&self, slug: &str) -> Result<Vec<MenuItemRecord>, RepoError>;

    /// Replaces every column except `created_at`. Returns [`RepoError::NotFound`]
    /// when no row has `id`.
    async fn update_item(&self, id: i32, params: MenuItemParams)
    -> Result<MenuItemRecord, RepoError>;

    /// Returns [`RepoError::NotFound`] when no row has `id`.
    async fn delete_item(&self, id: i32) -> Result<(), RepoError>;
}

#[async_trait]
pub trait NewsRepo: Send + Sync {
    async fn create_news(&self, params: NewsParams) -> Result<NewsRecord, RepoError>;

    async fn find_news(&self, id: i32) -> Result<Option<NewsRecord>, RepoError>;

    /// Newest `posted_at` first.
    async fn list_news(&self) -> Result<Vec<NewsRecord>, RepoError>;

    async fn update_news(&self, id: i32, params: NewsParams) -> Result<NewsRecord, RepoError>;

    async fn delete_news(&self, id: i32) -> Result<(), RepoError>;
}

#[async_trait]
pub trait HealthRepo: Send + Sync {
    async fn health_check(&self) -> Result<(), RepoError>;
}
