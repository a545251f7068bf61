//! Carts service errors.

use rebate::content::CartStatus;
use thiserror::Error;

use crate::{domain::pricing::PricingServiceError, store::StoreError};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("cart already exists")]
    AlreadyExists,

    #[error("cart not found")]
    NotFound,

    #[error("quantity must be at least 1, got {0}")]
    InvalidQuantity(u32),

    #[error("product has no price")]
    ProductNotPriced,

    #[error("cart is {}", .0.as_str())]
    CartNotOpen(CartStatus),

    #[error(transparent)]
    Pricing(#[from] PricingServiceError),

    #[error("storage error")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for CartsServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            StoreError::AlreadyExists => Self::AlreadyExists,
            StoreError::LimitReached | StoreError::Unavailable(_) => Self::Storage(error),
        }
    }
}
