use std::sync::Arc;

use thiserror::Error;
use time::OffsetDateTime;
use tracing::info;

use crate::application::categories::{CategoryError, CategoryRegistry, CleanupOutcome, ResolvedCategory};
use crate::application::images::{ImageError, ImageReconciler, ImageUpload};
use crate::application::repos::{MenuItemParams, MenuRepo, RepoError};
use crate::cache::ReadCache;
use crate::domain::entities::MenuItemRecord;
use crate::domain::error::DomainError;
use crate::domain::fields::{optional_text, required_text, validate_calories};

#[derive(Debug, Error)]
pub enum MenuError {
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("menu item not found")]
    NotFound,
    #[error(transparent)]
    Category(#[from] CategoryError),
    #[error(transparent)]
    Images(#[from] ImageError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Debug, Clone)]
pub struct MenuItemCommand {
    pub title: String,
    pub price: i32,
    pub calories: Option<i32>,
    pub description: Option<String>,
    /// Native (Russian) category name; the slug is derived from it.
    pub category: String,
    /// Previously stored image URLs the caller wants to keep, in order.
    pub kept_images: Vec<String>,
    pub uploads: Vec<ImageUpload>,
}

#[derive(Debug, Clone)]
pub struct MenuItemUpdate {
    pub item: MenuItemRecord,
    /// Cleanup of the category the item moved away from, if it moved.
    pub previous_category_cleanup: Option<CleanupOutcome>,
}

#[derive(Debug, Clone)]
pub struct MenuItemDeletion {
    pub item: MenuItemRecord,
    pub category_cleanup: CleanupOutcome,
}

struct ValidatedItem {
    title: String,
    price: i32,
    calories: Option<i32>,
    description: Option<String>,
    category: String,
}

#[derive(Clone)]
pub struct MenuService {
    items: Arc<dyn MenuRepo>,
    categories: CategoryRegistry,
    images: ImageReconciler,
    cache: Arc<ReadCache>,
}

impl MenuService {
    pub fn new(
        items: Arc<dyn MenuRepo>,
        categories: CategoryRegistry,
        images: ImageReconciler,
        cache: Arc<ReadCache>,
    ) -> Self {
        Self {
            items,
            categories,
            images,
            cache,
        }
    }

    pub fn categories(&self) -> &CategoryRegistry {
        &self.categories
    }

    /// Full menu, served from the cache when possible.
    pub async fn list(&self) -> Result<Vec<MenuItemRecord>, MenuError> {
        if let Some(cached) = self.cache.menu() {
            return Ok(cached);
        }

        let generation = self.cache.generation();
        let items = self.items.list_items().await?;
        self.cache.set_menu(items.clone(), generation);
        Ok(items)
    }

    pub async fn get(&self, id: i32) -> Result<MenuItemRecord, MenuError> {
        self.items.find_item(id).await?.ok_or(MenuError::NotFound)
    }

    pub async fn create(&self, command: MenuItemCommand) -> Result<MenuItemRecord, MenuError> {
        let validated = validate(&command)?;
        self.images.validate(&command.uploads)?;

        let category = self.categories.ensure_category(&validated.category).await?;
        let images = match self
            .images
            .reconcile(&[], command.kept_images, command.uploads)
            .await
        {
            Ok(images) => images,
            Err(err) => {
                self.release_new_category(&category).await;
                return Err(err.into());
            }
        };

        let now = OffsetDateTime::now_utc();
        let params = params(validated, &category, images.urls, now);
        let item = match self.items.create_item(params).await {
            Ok(item) => item,
            Err(err) => {
                self.images.discard(&images.stored).await;
                self.release_new_category(&category).await;
                return Err(err.into());
            }
        };

        self.cache.invalidate_menu_and_categories();
        info!(item_id = item.id, category = %item.category, "Created menu item");
        Ok(item)
    }

    /// Replace an item. Images dropped from the list are deleted before the
    /// row is written; `created_at` is never touched.
    pub async fn update(&self, id: i32, command: MenuItemCommand) -> Result<MenuItemUpdate, MenuError> {
        let validated = validate(&command)?;
        self.images.validate(&command.uploads)?;

        let current = self.get(id).await?;
        let category = self.categories.ensure_category(&validated.category).await?;
        let images = match self
            .images
            .reconcile(&current.image_urls, command.kept_images, command.uploads)
            .await
        {
            Ok(images) => images,
            Err(err) => {
                self.release_new_category(&category).await;
                return Err(err.into());
            }
        };

        let now = OffsetDateTime::now_utc();
        let params = params(validated, &category, images.urls, now);
        let item = match self.items.update_item(id, params).await {
            Ok(item) => item,
            Err(err) => {
                self.images.discard(&images.stored).await;
                self.release_new_category(&category).await;
                return Err(match err {
                    RepoError::NotFound => MenuError::NotFound,
                    other => other.into(),
                });
            }
        };

        let previous_category_cleanup = if current.category != item.category {
            Some(self.categories.delete_if_unused(&current.category).await)
        } else {
            None
        };

        self.cache.invalidate_menu_and_categories();
        info!(
            item_id = item.id,
            removed_images = images.deleted.len(),
            "Updated menu item"
        );
        Ok(MenuItemUpdate {
            item,
            previous_category_cleanup,
        })
    }

    /// Delete an item with its images, then drop its category if it was the last one.
    pub async fn delete(&self, id: i32) -> Result<MenuItemDeletion, MenuError> {
        let item = self.get(id).await?;

        self.images.remove_all(&item.image_urls).await?;
        self.items.delete_item(id).await.map_err(|err| match err {
            RepoError::NotFound => MenuError::NotFound,
            other => other.into(),
        })?;

        let category_cleanup = self.categories.delete_if_unused(&item.category).await;
        self.cache.invalidate_menu_and_categories();
        info!(item_id = id, cleanup = ?category_cleanup, "Deleted menu item");

        Ok(MenuItemDeletion {
            item,
            category_cleanup,
        })
    }

    async fn release_new_category(&self, category: &ResolvedCategory) {
        if category.created {
            self.categories.delete_if_unused(&category.slug).await;
        }
    }
}

fn validate(command: &MenuItemCommand) -> Result<ValidatedItem, DomainError> {
    let title = required_text("title", &command.title)?;
    let category = required_text("category", &command.category)?;
    if command.price < 0 {
        return Err(DomainError::validation("price must not be negative"));
    }
    let calories = validate_calories(command.calories)?;
    let description = optional_text(command.description.as_deref());

    Ok(ValidatedItem {
        title,
        price: command.price,
        calories,
        description,
        category,
    })
}

fn params(
    validated: ValidatedItem,
    category: &ResolvedCategory,
    image_urls: Vec<String>,
    timestamp: OffsetDateTime,
) -> MenuItemParams {
    MenuItemParams {
        title: validated.title,
        price: validated.price,
        image_urls,
        calories: validated.calories,
        description: validated.description,
        category: category.slug.clone(),
        timestamp,
    }
}
