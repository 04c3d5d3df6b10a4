//! Catalog service trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use domain::{Product, ProductId};

use crate::connector::BackendRole;
use crate::error::ServiceError;

/// Trait for product lookups.
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Returns the product with the given id, or [`ServiceError::NotFound`].
    async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError>;
}

#[derive(Debug, Default)]
struct InMemoryCatalogState {
    products: HashMap<ProductId, Product>,
    delays: HashMap<ProductId, Duration>,
    offline: bool,
    lookups: usize,
}

/// In-memory catalog service for testing.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalogService {
    state: Arc<RwLock<InMemoryCatalogState>>,
}

impl InMemoryCatalogService {
    /// Creates a new, empty in-memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog preloaded with `products`.
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let service = Self::new();
        for product in products {
            service.insert(product);
        }
        service
    }

    /// Adds or replaces a product.
    pub fn insert(&self, product: Product) {
        self.state
            .write()
            .unwrap()
            .products
            .insert(product.id.clone(), product);
    }

    /// Makes every lookup fail as if the backend were down.
    pub fn set_offline(&self, offline: bool) {
        self.state.write().unwrap().offline = offline;
    }

    /// Makes lookups of `id` take `delay` before answering.
    pub fn set_lookup_delay(&self, id: impl Into<ProductId>, delay: Duration) {
        self.state.write().unwrap().delays.insert(id.into(), delay);
    }

    /// Returns how many lookups were made.
    pub fn lookups(&self) -> usize {
        self.state.read().unwrap().lookups
    }
}

#[async_trait]
impl CatalogService for InMemoryCatalogService {
    async fn get_product(&self, id: &ProductId) -> Result<Product, ServiceError> {
        let delay = self.state.read().unwrap().delays.get(id).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.write().unwrap();
        state.lookups += 1;
        if state.offline {
            return Err(ServiceError::Unreachable {
                role: BackendRole::Catalog,
                address: "in-memory".to_string(),
                reason: "Catalog offline".to_string(),
            });
        }
        state
            .products
            .get(id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound {
                entity: "product",
                id: id.to_string(),
            })
    }
}
