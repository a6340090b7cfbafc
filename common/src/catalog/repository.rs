// Catalog repository: availability guard + validation in front of a store

use super::{validation, CatalogStore};
use crate::errors::CatalogError;
use crate::models::{Category, NewCategory, NewResource, Resource, ResourceFilter};
use crate::telemetry;
use std::fmt;
use std::sync::Arc;
use tracing::instrument;

/// Outcome of startup as seen by the catalog
#[derive(Clone)]
pub enum Persistence {
    Ready(Arc<dyn CatalogStore>),
    Degraded { reason: String },
}

impl Persistence {
    pub fn degraded(reason: impl Into<String>) -> Self {
        Persistence::Degraded {
            reason: reason.into(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Persistence::Ready(_))
    }
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Persistence::Ready(_) => f.write_str("Ready"),
            Persistence::Degraded { reason } => {
                f.debug_struct("Degraded").field("reason", reason).finish()
            }
        }
    }
}

/// Typed query/command surface over categories and resources
///
/// Every operation first checks that persistence is ready. In degraded mode
/// each call fails with `CatalogError::PersistenceUnavailable` without
/// touching any store.
#[derive(Clone, Debug)]
pub struct CatalogRepository {
    persistence: Persistence,
}

impl CatalogRepository {
    pub fn new(persistence: Persistence) -> Self {
        Self { persistence }
    }

    /// Repository over a ready store
    pub fn with_store(store: Arc<dyn CatalogStore>) -> Self {
        Self::new(Persistence::Ready(store))
    }

    pub fn is_available(&self) -> bool {
        self.persistence.is_ready()
    }

    fn store(&self) -> Result<&dyn CatalogStore, CatalogError> {
        match &self.persistence {
            Persistence::Ready(store) => Ok(store.as_ref()),
            Persistence::Degraded { reason } => {
                Err(CatalogError::PersistenceUnavailable(reason.clone()))
            }
        }
    }

    /// All categories, ascending by id
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let result = async { self.store()?.list_categories().await }.await;
        telemetry::observe_catalog_operation("list_categories", result)
    }

    #[instrument(skip(self))]
    pub async fn get_category(&self, id: i32) -> Result<Category, CatalogError> {
        let result = async {
            self.store()?
                .get_category(id)
                .await?
                .ok_or_else(|| CatalogError::not_found("category", id))
        }
        .await;
        telemetry::observe_catalog_operation("get_category", result)
    }

    /// Create a category with a unique, non-empty name
    #[instrument(skip(self, description))]
    pub async fn create_category(
        &self,
        name: &str,
        description: &str,
    ) -> Result<Category, CatalogError> {
        let result = async {
            let store = self.store()?;
            let input = validation::category(&NewCategory::new(name, description))?;
            let category = store.insert_category(&input).await?;
            tracing::info!(category_id = category.id, name = %category.name, "Category created");
            Ok::<_, CatalogError>(category)
        }
        .await;
        telemetry::observe_catalog_operation("create_category", result)
    }

    /// Delete a category that no resource references
    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: i32) -> Result<(), CatalogError> {
        let result = async {
            self.store()?.delete_category(id).await?;
            tracing::info!(category_id = id, "Category deleted");
            Ok::<_, CatalogError>(())
        }
        .await;
        telemetry::observe_catalog_operation("delete_category", result)
    }

    /// Resources newest first, optionally narrowed by category and/or featured flag
    #[instrument(skip(self))]
    pub async fn list_resources(
        &self,
        filter: ResourceFilter,
    ) -> Result<Vec<Resource>, CatalogError> {
        let result = async { self.store()?.list_resources(&filter).await }.await;
        telemetry::observe_catalog_operation("list_resources", result)
    }

    /// Case-insensitive substring search over title and description.
    /// A blank query returns the same list as `list_resources` with no filter;
    /// any other query is matched as given, surrounding spaces included.
    #[instrument(skip(self))]
    pub async fn search_resources(&self, query: &str) -> Result<Vec<Resource>, CatalogError> {
        let result = async {
            let store = self.store()?;
            if query.trim().is_empty() {
                store.list_resources(&ResourceFilter::default()).await
            } else {
                store.search_resources(query).await
            }
        }
        .await;
        telemetry::observe_catalog_operation("search_resources", result)
    }

    #[instrument(skip(self))]
    pub async fn get_resource(&self, id: i32) -> Result<Resource, CatalogError> {
        let result = async {
            self.store()?
                .get_resource(id)
                .await?
                .ok_or_else(|| CatalogError::not_found("resource", id))
        }
        .await;
        telemetry::observe_catalog_operation("get_resource", result)
    }

    /// Create a resource under an existing category
    ///
    /// Field errors are reported before the category is looked up.
    #[instrument(skip(self, input), fields(category_id = input.category_id))]
    pub async fn create_resource(&self, input: &NewResource) -> Result<Resource, CatalogError> {
        let result = async {
            let store = self.store()?;
            let input = validation::resource(input)?;
            let resource = store.insert_resource(&input).await?;
            tracing::info!(
                resource_id = resource.id,
                category_id = resource.category_id,
                featured = resource.featured,
                "Resource created"
            );
            Ok::<_, CatalogError>(resource)
        }
        .await;
        telemetry::observe_catalog_operation("create_resource", result)
    }

    /// Remove a resource. Deleting an id that is already gone is `NotFound`.
    #[instrument(skip(self))]
    pub async fn delete_resource(&self, id: i32) -> Result<(), CatalogError> {
        let result = async {
            self.store()?.delete_resource(id).await?;
            tracing::info!(resource_id = id, "Resource deleted");
            Ok::<_, CatalogError>(())
        }
        .await;
        telemetry::observe_catalog_operation("delete_resource", result)
    }

    #[instrument(skip(self))]
    pub async fn set_featured(&self, id: i32, featured: bool) -> Result<Resource, CatalogError> {
        let result = async {
            let resource = self.store()?.set_featured(id, featured).await?;
            tracing::info!(resource_id = id, featured, "Resource featured flag updated");
            Ok::<_, CatalogError>(resource)
        }
        .await;
        telemetry::observe_catalog_operation("set_featured", result)
    }
}
