//! Products

use async_trait::async_trait;
use rebate::products::{Product, ProductUuid};

use crate::{domain::products::ProductsRepository, store::StoreError};

use super::MemoryStore;

#[async_trait]
impl ProductsRepository for MemoryStore {
    async fn get_products(&self, products: &[ProductUuid]) -> Result<Vec<Product>, StoreError> {
        let tables = self.tables.read().await;

        products
            .iter()
            .map(|uuid| tables.products.get(uuid).cloned().ok_or(StoreError::NotFound))
            .collect()
    }
}
