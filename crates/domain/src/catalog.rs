//! Catalog plumbing: product creation and browsing.

use common::{Money, ProductId};
use store::{InventoryLedger, Product};

use crate::error::DomainError;

/// Fields for a new catalog product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub quantity: u32,
    pub price: Money,
    pub discount: Money,
}

pub struct CatalogService<S> {
    store: S,
}

impl<S: InventoryLedger> CatalogService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Persists a new product. The effective unit price is derived from the
    /// list price and markdown here, once, at write time.
    #[tracing::instrument(skip(self, new))]
    pub async fn create_product(&self, new: NewProduct) -> Result<Product, DomainError> {
        let product = Product::new(new.name, new.description, new.quantity, new.price, new.discount);
        self.store.create_product(&product).await?;
        Ok(product)
    }

    pub async fn get_product(&self, product_id: ProductId) -> Result<Product, DomainError> {
        self.store
            .find_product(product_id)
            .await?
            .ok_or(DomainError::ProductNotFound { product_id })
    }

    pub async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.store.list_products().await?)
    }
}
