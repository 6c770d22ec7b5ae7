//! Catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use goshop_core::{Money, ProductId};

/// Category label that means "no category filter".
pub const ALL_CATEGORIES: &str = "Semua";

/// Stock given to products created without an explicit amount.
pub const DEFAULT_STOCK: i64 = 10;

/// A product in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    /// Public URL of the product image.
    pub image: String,
    pub category: String,
    pub stock: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields for a product about to be inserted.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub price: Money,
    pub image: String,
    pub category: String,
    pub stock: i64,
}

/// Catalog query parameters (`GET /api/products?search=&category=`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    pub search: Option<String>,
    pub category: Option<String>,
}

impl ProductFilter {
    /// Name substring to match, if any.
    #[must_use]
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Exact category to match. `None` for empty or [`ALL_CATEGORIES`].
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semua_means_all() {
        let filter = ProductFilter {
            search: None,
            category: Some(ALL_CATEGORIES.to_string()),
        };
        assert_eq!(filter.category(), None);
    }

    #[test]
    fn test_blank_params_ignored() {
        let filter = ProductFilter {
            search: Some("  ".to_string()),
            category: Some(String::new()),
        };
        assert_eq!(filter.search_term(), None);
        assert_eq!(filter.category(), None);
    }

    #[test]
    fn test_params_trimmed() {
        let filter = ProductFilter {
            search: Some(" kopi ".to_string()),
            category: Some("Minuman".to_string()),
        };
        assert_eq!(filter.search_term(), Some("kopi"));
        assert_eq!(filter.category(), Some("Minuman"));
    }
}
