//! Menu category registry.
//!
//! Categories are created implicitly when a menu item names a new one and
//! disappear when their last item goes away. Menu items point at a category
//! through its slug (`name_en`), and all slug matching stays in this module.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::application::repos::{CategoriesRepo, CategoryRemoval, MenuRepo, RepoError};
use crate::cache::ReadCache;
use crate::domain::entities::{BlockingItem, MenuCategoryRecord};
use crate::domain::slug::{SlugError, category_slug};

#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("invalid category name: {0}")]
    InvalidName(#[from] SlugError),
    #[error("category not found")]
    NotFound,
    #[error("category is referenced by {} menu items", .blocking.len())]
    InUse { blocking: Vec<BlockingItem> },
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Category a menu item was filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCategory {
    pub id: i32,
    pub slug: String,
    pub created: bool,
}

/// Result of the advisory cleanup after an item leaves a category.
///
/// Never turned into an error for the caller; failures are logged and
/// reported here so the attempt stays observable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed,
    StillReferenced,
    /// No category row carries the slug.
    NotPresent,
    Failed(String),
}

#[derive(Clone)]
pub struct CategoryRegistry {
    categories: Arc<dyn CategoriesRepo>,
    menu: Arc<dyn MenuRepo>,
    cache: Arc<ReadCache>,
}

impl CategoryRegistry {
    pub fn new(
        categories: Arc<dyn CategoriesRepo>,
        menu: Arc<dyn MenuRepo>,
        cache: Arc<ReadCache>,
    ) -> Self {
        Self {
            categories,
            menu,
            cache,
        }
    }

    /// Get or create the category named `name_native`, returning its slug.
    ///
    /// An existing row keeps its stored slug even if the current
    /// transliteration would derive a different one.
    pub async fn ensure_category(&self, name_native: &str) -> Result<ResolvedCategory, CategoryError> {
        let name = name_native.trim();
        let slug = category_slug(name)?;
        let upsert = self.categories.upsert_category(name, &slug).await?;

        if upsert.created {
            info!(
                category_id = upsert.id,
                name_ru = name,
                name_en = %upsert.name_en,
                "Created menu category"
            );
            self.cache.invalidate_menu_and_categories();
        }

        Ok(ResolvedCategory {
            id: upsert.id,
            slug: upsert.name_en,
            created: upsert.created,
        })
    }

    /// Categories in display order, served from the cache when possible.
    pub async fn list_categories(&self) -> Result<Vec<MenuCategoryRecord>, CategoryError> {
        if let Some(cached) = self.cache.categories() {
            return Ok(cached);
        }

        let generation = self.cache.generation();
        let categories = self.categories.list_categories().await?;
        self.cache.set_categories(categories.clone(), generation);
        Ok(categories)
    }

    /// Overwrite one category's sort order; other rows are left as they are.
    pub async fn update_sort_order(&self, id: i32, sort_order: i32) -> Result<(), CategoryError> {
        self.categories
            .update_sort_order(id, sort_order)
            .await
            .map_err(not_found_as(CategoryError::NotFound))?;
        self.cache.invalidate_menu_and_categories();
        Ok(())
    }

    /// Remove the category behind `slug` if no menu item still uses it.
    pub async fn delete_if_unused(&self, slug: &str) -> CleanupOutcome {
        match self.categories.delete_category_if_unused(slug).await {
            Ok(CategoryRemoval::Removed) => {
                info!(name_en = slug, "Removed unused menu category");
                self.cache.invalidate_menu_and_categories();
                CleanupOutcome::Removed
            }
            Ok(CategoryRemoval::InUse) => CleanupOutcome::StillReferenced,
            Ok(CategoryRemoval::Missing) => {
                debug!(name_en = slug, "No menu category to clean up");
                CleanupOutcome::NotPresent
            }
            Err(err) => {
                warn!(
                    name_en = slug,
                    error = %err,
                    "Advisory category cleanup failed"
                );
                CleanupOutcome::Failed(err.to_string())
            }
        }
    }

    /// Delete a category on explicit request, refusing while items use it.
    pub async fn delete_category(&self, id: i32) -> Result<(), CategoryError> {
        let category = self
            .categories
            .find_category(id)
            .await?
            .ok_or(CategoryError::NotFound)?;

        let blocking: Vec<BlockingItem> = self
            .menu
            .list_items_in_category(&category.name_en)
            .await?
            .iter()
            .map(BlockingItem::from)
            .collect();
        if !blocking.is_empty() {
            return Err(CategoryError::InUse { blocking });
        }

        self.delete_by_id(id).await
    }

    /// Hard delete regardless of usage.
    pub async fn delete_by_id(&self, id: i32) -> Result<(), CategoryError> {
        self.categories
            .delete_category(id)
            .await
            .map_err(not_found_as(CategoryError::NotFound))?;
        self.cache.invalidate_menu_and_categories();
        Ok(())
    }
}

fn not_found_as(missing: CategoryError) -> impl FnOnce(RepoError) -> CategoryError {
    move |err| match err {
        RepoError::NotFound => missing,
        other => CategoryError::Repo(other),
    }
}
