// In-memory catalog store for tests and local runs without PostgreSQL

use super::CatalogStore;
use crate::errors::{CatalogError, ValidationError};
use crate::models::{Category, NewCategory, NewResource, Resource, ResourceFilter};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    categories: BTreeMap<i32, Category>,
    resources: BTreeMap<i32, Resource>,
    last_category_id: i32,
    last_resource_id: i32,
}

impl State {
    fn sorted_resources<F>(&self, keep: F) -> Vec<Resource>
    where
        F: Fn(&Resource) -> bool,
    {
        let mut out: Vec<Resource> = self.resources.values().filter(|r| keep(r)).cloned().collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }
}

/// Catalog store held entirely in process memory
///
/// Mirrors the PostgreSQL schema's guarantees: ids come from monotonically
/// increasing counters and are never reused, category names are unique, and
/// resources must point at an existing category.
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    state: RwLock<State>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_categories(&self) -> Result<Vec<Category>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.categories.values().cloned().collect())
    }

    async fn get_category(&self, id: i32) -> Result<Option<Category>, CatalogError> {
        Ok(self.state.read().await.categories.get(&id).cloned())
    }

    async fn insert_category(&self, input: &NewCategory) -> Result<Category, CatalogError> {
        let mut state = self.state.write().await;

        if state.categories.values().any(|c| c.name == input.name) {
            return Err(ValidationError::ConstraintViolation(format!(
                "category name '{}' is already in use",
                input.name
            ))
            .into());
        }

        state.last_category_id += 1;
        let category = Category {
            id: state.last_category_id,
            name: input.name.clone(),
            description: input.description.clone(),
        };
        state.categories.insert(category.id, category.clone());
        Ok(category)
    }

    async fn delete_category(&self, id: i32) -> Result<(), CatalogError> {
        let mut state = self.state.write().await;

        if !state.categories.contains_key(&id) {
            return Err(CatalogError::not_found("category", id));
        }

        let referencing = state
            .resources
            .values()
            .filter(|r| r.category_id == id)
            .count();
        if referencing > 0 {
            return Err(ValidationError::ConstraintViolation(format!(
                "category {} is still referenced by {} resource(s)",
                id, referencing
            ))
            .into());
        }

        state.categories.remove(&id);
        Ok(())
    }

    async fn list_resources(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, CatalogError> {
        let state = self.state.read().await;
        Ok(state.sorted_resources(|r| filter.matches(r)))
    }

    async fn search_resources(&self, needle: &str) -> Result<Vec<Resource>, CatalogError> {
        let needle = needle.to_lowercase();
        let state = self.state.read().await;
        Ok(state.sorted_resources(|r| {
            r.title.to_lowercase().contains(&needle)
                || r.description.to_lowercase().contains(&needle)
        }))
    }

    async fn get_resource(&self, id: i32) -> Result<Option<Resource>, CatalogError> {
        Ok(self.state.read().await.resources.get(&id).cloned())
    }

    async fn insert_resource(&self, input: &NewResource) -> Result<Resource, CatalogError> {
        let mut state = self.state.write().await;

        if !state.categories.contains_key(&input.category_id) {
            return Err(CatalogError::not_found("category", input.category_id));
        }

        state.last_resource_id += 1;
        let resource = Resource {
            id: state.last_resource_id,
            title: input.title.clone(),
            description: input.description.clone(),
            url: input.url.clone(),
            category_id: input.category_id,
            featured: input.featured,
            created_at: Utc::now(),
        };
        state.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn delete_resource(&self, id: i32) -> Result<(), CatalogError> {
        self.state
            .write()
            .await
            .resources
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| CatalogError::not_found("resource", id))
    }

    async fn set_featured(&self, id: i32, featured: bool) -> Result<Resource, CatalogError> {
        let mut state = self.state.write().await;
        let resource = state
            .resources
            .get_mut(&id)
            .ok_or_else(|| CatalogError::not_found("resource", id))?;
        resource.featured = featured;
        Ok(resource.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ids_are_not_reused_after_delete() {
        let store = InMemoryCatalogStore::new();
        let category = store
            .insert_category(&NewCategory::new("CI/CD", ""))
            .await
            .unwrap();

        let input = NewResource::new("a", "b", "https://example.com", category.id);
        let first = store.insert_resource(&input).await.unwrap();
        store.delete_resource(first.id).await.unwrap();
        let second = store.insert_resource(&input).await.unwrap();

        assert!(second.id > first.id);
    }

    #[tokio::test]
    async fn test_newest_first_with_id_tiebreak() {
        let store = InMemoryCatalogStore::new();
        let category = store
            .insert_category(&NewCategory::new("Cloud", ""))
            .await
            .unwrap();
        for title in ["first", "second", "third"] {
            store
                .insert_resource(&NewResource::new(title, "d", "https://e.com", category.id))
                .await
                .unwrap();
        }

        let titles: Vec<String> = store
            .list_resources(&ResourceFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_search_matches_description() {
        let store = InMemoryCatalogStore::new();
        let category = store
            .insert_category(&NewCategory::new("Docs", ""))
            .await
            .unwrap();
        store
            .insert_resource(&NewResource::new(
                "Runbook",
                "On-call Escalation steps",
                "https://e.com",
                category.id,
            ))
            .await
            .unwrap();

        assert_eq!(store.search_resources("escalation").await.unwrap().len(), 1);
        assert!(store.search_resources("pager").await.unwrap().is_empty());
    }
}
