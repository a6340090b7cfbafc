// Search façade over the catalog repository

use crate::catalog::CatalogRepository;
use crate::errors::CatalogError;
use crate::models::Resource;
use tracing::instrument;

/// Single entry point for free-text resource search
///
/// Queries are trimmed and internal whitespace runs collapse to one space
/// before they reach the repository, so `"  jenkins   guide "` and
/// `"jenkins guide"` return the same rows.
#[derive(Debug, Clone)]
pub struct SearchFacade {
    repository: CatalogRepository,
}

impl SearchFacade {
    pub fn new(repository: CatalogRepository) -> Self {
        Self { repository }
    }

    pub fn normalize(raw: &str) -> String {
        raw.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// An empty or blank query lists every resource
    #[instrument(skip(self))]
    pub async fn search(&self, raw: &str) -> Result<Vec<Resource>, CatalogError> {
        let query = Self::normalize(raw);
        self.repository.search_resources(&query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{InMemoryCatalogStore, Persistence};
    use crate::models::NewResource;
    use std::sync::Arc;

    async fn seeded() -> SearchFacade {
        let repo = CatalogRepository::with_store(Arc::new(InMemoryCatalogStore::new()));
        let category = repo.create_category("CI/CD", "").await.unwrap();
        for (title, description) in [
            ("Jenkins Guide", "pipeline setup"),
            ("GitHub Actions", "workflow syntax"),
        ] {
            repo.create_resource(&NewResource::new(
                title,
                description,
                "https://example.com",
                category.id,
            ))
            .await
            .unwrap();
        }
        SearchFacade::new(repo)
    }

    #[test]
    fn test_normalize() {
        assert_eq!(SearchFacade::normalize("  jenkins \t  guide \n"), "jenkins guide");
        assert_eq!(SearchFacade::normalize("   "), "");
    }

    #[tokio::test]
    async fn test_collapsed_whitespace_matches() {
        let search = seeded().await;
        let hits = search.search("  JENKINS    guide ").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "Jenkins Guide");
    }

    #[tokio::test]
    async fn test_blank_query_lists_everything() {
        let search = seeded().await;
        assert_eq!(search.search(" \t ").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_degraded_search_fails() {
        let search = SearchFacade::new(CatalogRepository::new(Persistence::degraded("down")));
        assert!(matches!(
            search.search("jenkins").await,
            Err(CatalogError::PersistenceUnavailable(_))
        ));
    }
}
