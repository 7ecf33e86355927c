use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{MenuItemParams, MenuRepo, RepoError},
    domain::entities::MenuItemRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

const MENU_COLUMNS: &str =
    "id, title, price, image_urls, calories, description, category, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct MenuItemRow {
    id: i32,
    title: String,
    price: i32,
    image_urls: Vec<String>,
    calories: Option<i32>,
    description: Option<String>,
    category: String,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<MenuItemRow> for MenuItemRecord {
    fn from(row: MenuItemRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            price: row.price,
            image_urls: row.image_urls,
            calories: row.calories,
            description: row.description,
            category: row.category,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl MenuRepo for PostgresRepositories {
    async fn create_item(&self, params: MenuItemParams) -> Result<MenuItemRecord, RepoError> {
        let sql = format!(
            "INSERT INTO menu (title, price, image_urls, calories, description, category, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) \
             RETURNING {MENU_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(params.title)
            .bind(params.price)
            .bind(params.image_urls)
            .bind(params.calories)
            .bind(params.description)
            .bind(params.category)
            .bind(params.timestamp)
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn find_item(&self, id: i32) -> Result<Option<MenuItemRecord>, RepoError> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menu WHERE id = $1");
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(MenuItemRecord::from))
    }

    async fn list_items(&self) -> Result<Vec<MenuItemRecord>, RepoError> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menu ORDER BY id");
        let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuItemRecord::from).collect())
    }

    async fn list_items_in_category(&self, slug: &str) -> Result<Vec<MenuItemRecord>, RepoError> {
        let sql = format!("SELECT {MENU_COLUMNS} FROM menu WHERE category = $1 ORDER BY id");
        let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(slug)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuItemRecord::from).collect())
    }

    async fn update_item(
        &self,
        id: i32,
        params: MenuItemParams,
    ) -> Result<MenuItemRecord, RepoError> {
        let sql = format!(
            "UPDATE menu \
             SET title = $2, price = $3, image_urls = $4, calories = $5, \
                 description = $6, category = $7, updated_at = $8 \
             WHERE id = $1 \
             RETURNING {MENU_COLUMNS}"
        );
        let row = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .bind(params.title)
            .bind(params.price)
            .bind(params.image_urls)
            .bind(params.calories)
            .bind(params.description)
            .bind(params.category)
            .bind(params.timestamp)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        row.map(MenuItemRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_item(&self, id: i32) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM menu WHERE id = $1")
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
