//! Products Repository

use async_trait::async_trait;
use mockall::automock;
use rebate::products::{Product, ProductUuid};

use crate::store::StoreError;

/// Catalogue lookup.
#[automock]
#[async_trait]
pub trait ProductsRepository: Send + Sync {
    /// Fetch products with their prices and range attributes, in the order requested.
    ///
    /// Fails with [`StoreError::NotFound`] if any product is unknown.
    async fn get_products(&self, products: &[ProductUuid]) -> Result<Vec<Product>, StoreError>;
}
