// Catalog of categories and resources
//
// `CatalogRepository` is the only entry point callers use. It checks that
// persistence is available and validates input, then hands off to a
// `CatalogStore` backend.

pub mod memory;
pub mod postgres;
pub mod repository;
pub mod validation;

pub use memory::InMemoryCatalogStore;
pub use postgres::PgCatalogStore;
pub use repository::{CatalogRepository, Persistence};

use crate::errors::CatalogError;
use crate::models::{Category, NewCategory, NewResource, Resource, ResourceFilter};
use async_trait::async_trait;

/// Storage backend for the catalog
///
/// Implementations enforce what the database would: unique category names,
/// referential integrity from resources to categories, and ids that are never
/// handed out twice. Input reaching a store has already been validated and
/// trimmed. Resource listings are ordered newest first, ties broken by id
/// descending.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError>;

    async fn get_category(&self, id: i32) -> Result<Option<Category>, CatalogError>;

    async fn insert_category(&self, input: &NewCategory) -> Result<Category, CatalogError>;

    /// Fails with a constraint violation while any resource references the category
    async fn delete_category(&self, id: i32) -> Result<(), CatalogError>;

    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, CatalogError>;

    /// Case-insensitive substring match on title or description
    async fn search_resources(&self, needle: &str) -> Result<Vec<Resource>, CatalogError>;

    async fn get_resource(&self, id: i32) -> Result<Option<Resource>, CatalogError>;

    async fn insert_resource(&self, input: &NewResource) -> Result<Resource, CatalogError>;

    async fn delete_resource(&self, id: i32) -> Result<(), CatalogError>;

    async fn set_featured(&self, id: i32, featured: bool) -> Result<Resource, CatalogError>;
}
