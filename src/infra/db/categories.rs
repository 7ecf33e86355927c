use async_trait::async_trait;
use time::OffsetDateTime;

use crate::{
    application::repos::{CategoriesRepo, CategoryRemoval, CategoryUpsert, RepoError},
    domain::entities::MenuCategoryRecord,
};

use super::{PostgresRepositories, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name_ru: String,
    name_en: String,
    sort_order: i32,
    created_at: OffsetDateTime,
}

impl From<CategoryRow> for MenuCategoryRecord {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name_ru: row.name_ru,
            name_en: row.name_en,
            sort_order: row.sort_order,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct UpsertRow {
    id: i32,
    name_en: String,
    created: bool,
}

#[async_trait]
impl CategoriesRepo for PostgresRepositories {
    async fn upsert_category(
        &self,
        name_ru: &str,
        name_en: &str,
    ) -> Result<CategoryUpsert, RepoError> {
        // The no-op DO UPDATE makes RETURNING yield the existing row on
        // conflict; xmax = 0 only for a freshly inserted tuple.
        let row = sqlx::query_as::<_, UpsertRow>(
            r#"
            INSERT INTO menu_categories (name_ru, name_en, sort_order)
            SELECT $1, $2, COALESCE(MAX(sort_order), 0) + 1
            FROM menu_categories
            ON CONFLICT (name_ru) DO UPDATE SET name_ru = EXCLUDED.name_ru
            RETURNING id, name_en, (xmax = 0) AS created
            "#,
        )
        .bind(name_ru)
        .bind(name_en)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(CategoryUpsert {
            id: row.id,
            name_en: row.name_en,
            created: row.created,
        })
    }

    async fn list_categories(&self) -> Result<Vec<MenuCategoryRecord>, RepoError> {
        let rows = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name_ru, name_en, sort_order, created_at
            FROM menu_categories
            ORDER BY sort_order, name_ru
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(MenuCategoryRecord::from).collect())
    }

    async fn find_category(&self, id: i32) -> Result<Option<MenuCategoryRecord>, RepoError> {
        let row = sqlx::query_as::<_, CategoryRow>(
            r#"
            SELECT id, name_ru, name_en, sort_order, created_at
            FROM menu_categories
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(MenuCategoryRecord::from))
    }

    async fn update_sort_order(&self, id: i32, sort_order: i32) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE menu_categories SET sort_order = $2 WHERE id = $1")
            .bind(id)
            .bind(sort_order)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete_category_if_unused(
        &self,
        name_en: &str,
    ) -> Result<CategoryRemoval, RepoError> {
        let result = sqlx::query(
            r#"
            DELETE FROM menu_categories c
            WHERE c.name_en = $1
              AND NOT EXISTS (SELECT 1 FROM menu m WHERE m.category = c.name_en)
            "#,
        )
        .bind(name_en)
        .execute(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() > 0 {
            return Ok(CategoryRemoval::Removed);
        }

        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM menu_categories WHERE name_en = $1)",
        )
        .bind(name_en)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(if exists {
            CategoryRemoval::InUse
        } else {
            CategoryRemoval::Missing
        })
    }

    async fn delete_category(&self, id: i32) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM menu_categories WHERE id = $1")
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
