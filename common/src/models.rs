use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ============================================================================
// Catalog Models
// ============================================================================

/// Category groups resources under a unique name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub description: String,
}

/// Resource is a single curated link, tool or tutorial
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub url: String,
    pub category_id: i32,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a category
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewCategory {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Input for creating a resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewResource {
    pub title: String,
    pub description: String,
    pub url: String,
    pub category_id: i32,
    #[serde(default)]
    pub featured: bool,
}

impl NewResource {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
        category_id: i32,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            url: url.into(),
            category_id,
            featured: false,
        }
    }

    pub fn featured(mut self, featured: bool) -> Self {
        self.featured = featured;
        self
    }
}

/// Optional narrowing for resource listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceFilter {
    #[serde(default, alias = "categoryId")]
    pub category_id: Option<i32>,
    #[serde(default)]
    pub featured: Option<bool>,
}

impl ResourceFilter {
    pub fn category(category_id: i32) -> Self {
        Self {
            category_id: Some(category_id),
            featured: None,
        }
    }

    pub fn featured_only() -> Self {
        Self {
            category_id: None,
            featured: Some(true),
        }
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        self.category_id.map_or(true, |id| resource.category_id == id)
            && self.featured.map_or(true, |f| resource.featured == f)
    }
}
