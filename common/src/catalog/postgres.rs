// PostgreSQL catalog store

use super::CatalogStore;
use crate::db::DbPool;
use crate::errors::{CatalogError, DatabaseError, ValidationError};
use crate::models::{Category, NewCategory, NewResource, Resource, ResourceFilter};
use async_trait::async_trait;
use tracing::instrument;

const RESOURCE_COLUMNS: &str = "id, title, description, url, category_id, featured, created_at";

/// Catalog store backed by the `categories` and `resources` tables
///
/// Each call checks a connection out of the pool for the duration of one
/// statement and returns it immediately afterwards.
#[derive(Debug, Clone)]
pub struct PgCatalogStore {
    pool: DbPool,
}

impl PgCatalogStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    #[instrument(skip(self))]
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, description
            FROM categories
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }

    #[instrument(skip(self))]
    async fn get_category(&self, id: i32) -> Result<Option<Category>, CatalogError> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, description FROM categories WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(category)
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn insert_category(&self, input: &NewCategory) -> Result<Category, CatalogError> {
        sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (name, description)
            VALUES ($1, $2)
            RETURNING id, name, description
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::DuplicateKey(_) => ValidationError::ConstraintViolation(format!(
                "category name '{}' is already in use",
                input.name
            ))
            .into(),
            other => other.into(),
        })
    }

    #[instrument(skip(self))]
    async fn delete_category(&self, id: i32) -> Result<(), CatalogError> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::ForeignKeyViolation(_) => {
                    CatalogError::from(ValidationError::ConstraintViolation(format!(
                        "category {} is still referenced by resources",
                        id
                    )))
                }
                other => other.into(),
            })?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("category", id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, CatalogError> {
        let resources = sqlx::query_as::<_, Resource>(&format!(
            r#"
            SELECT {RESOURCE_COLUMNS}
            FROM resources
            WHERE ($1::INTEGER IS NULL OR category_id = $1)
              AND ($2::BOOLEAN IS NULL OR featured = $2)
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(filter.category_id)
        .bind(filter.featured)
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(count = resources.len(), "Listed resources");
        Ok(resources)
    }

    #[instrument(skip(self))]
    async fn search_resources(&self, needle: &str) -> Result<Vec<Resource>, CatalogError> {
        // strpos keeps `%` and `_` in the needle literal
        let resources = sqlx::query_as::<_, Resource>(&format!(
            r#"
            SELECT {RESOURCE_COLUMNS}
            FROM resources
            WHERE strpos(lower(title), lower($1)) > 0
               OR strpos(lower(description), lower($1)) > 0
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(needle)
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(count = resources.len(), "Searched resources");
        Ok(resources)
    }

    #[instrument(skip(self))]
    async fn get_resource(&self, id: i32) -> Result<Option<Resource>, CatalogError> {
        let resource = sqlx::query_as::<_, Resource>(&format!(
            "SELECT {RESOURCE_COLUMNS} FROM resources WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(resource)
    }

    #[instrument(skip(self, input), fields(category_id = input.category_id))]
    async fn insert_resource(&self, input: &NewResource) -> Result<Resource, CatalogError> {
        sqlx::query_as::<_, Resource>(&format!(
            r#"
            INSERT INTO resources (title, description, url, category_id, featured)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.url)
        .bind(input.category_id)
        .bind(input.featured)
        .fetch_one(self.pool.pool())
        .await
        .map_err(|e| match DatabaseError::from(e) {
            DatabaseError::ForeignKeyViolation(_) => {
                CatalogError::not_found("category", input.category_id)
            }
            other => other.into(),
        })
    }

    #[instrument(skip(self))]
    async fn delete_resource(&self, id: i32) -> Result<(), CatalogError> {
        let result = sqlx::query("DELETE FROM resources WHERE id = $1")
            .bind(id)
            .execute(self.pool.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::not_found("resource", id));
        }

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_featured(&self, id: i32, featured: bool) -> Result<Resource, CatalogError> {
        sqlx::query_as::<_, Resource>(&format!(
            r#"
            UPDATE resources
            SET featured = $2
            WHERE id = $1
            RETURNING {RESOURCE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(featured)
        .fetch_optional(self.pool.pool())
        .await?
        .ok_or_else(|| CatalogError::not_found("resource", id))
    }
}
