//! # Product Service
//!
//! Catalog commands: add products, list and search what's orderable.
//! All writes go through the coordinator so catalog edits get the same
//! offline-first treatment as orders.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use atlas_core::{collections, validation, Operation, Product, RecordMeta};

use crate::error::StoreResult;
use crate::store::LocalStore;

// =============================================================================
// Inputs
// =============================================================================

/// Everything needed to add a product (the envelope is generated).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub price_cents: i64,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

// =============================================================================
// Service
// =============================================================================

/// Command/read surface over the product catalog.
#[derive(Clone)]
pub struct ProductService {
    store: Arc<LocalStore>,
}

impl ProductService {
    /// Creates a service over the store.
    pub fn new(store: Arc<LocalStore>) -> Self {
        ProductService { store }
    }

    /// Adds a product to the catalog.
    pub async fn add_product(&self, input: NewProduct) -> StoreResult<Product> {
        validation::validate_name("name", &input.name)?;
        validation::validate_name("category", &input.category)?;
        validation::validate_price("priceCents", input.price_cents)?;

        let product = Product {
            meta: RecordMeta::generate(),
            name: input.name,
            price_cents: input.price_cents,
            category: input.category,
            description: input.description,
            available: input.available,
        };

        debug!(id = %product.meta.id, name = %product.name, "Adding product");

        self.store
            .commit(vec![Operation::create(
                collections::PRODUCTS,
                product.meta.id.clone(),
                serde_json::to_value(&product)?,
            )])
            .await?;

        Ok(product)
    }

    /// Gets one product by id.
    pub async fn get(&self, id: &str) -> StoreResult<Option<Product>> {
        self.store.get(collections::PRODUCTS, id).await
    }

    /// Lists orderable products, optionally narrowed to a category.
    pub async fn list(&self, category: Option<&str>) -> StoreResult<Vec<Product>> {
        self.store
            .query(collections::PRODUCTS, |p: &Product| {
                p.available && category.map_or(true, |c| p.category == c)
            })
            .await
    }

    /// Case-insensitive search over name, description, and category.
    /// Unavailable products never match.
    pub async fn search(&self, query: &str) -> StoreResult<Vec<Product>> {
        let term = query.to_lowercase();
        self.store
            .query(collections::PRODUCTS, |p: &Product| {
                p.available
                    && (p.name.to_lowercase().contains(&term)
                        || p.category.to_lowercase().contains(&term)
                        || p
                            .description
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(&term)))
            })
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
