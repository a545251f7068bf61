//! Pricing service errors.

use rebate::errors::{ApplicationError, ConfigurationError, VoucherError};
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum PricingServiceError {
    /// Unknown cart, offer, voucher code or product.
    #[error("not found")]
    NotFound,

    /// The voucher cannot be redeemed against this cart.
    #[error(transparent)]
    Voucher(#[from] VoucherError),

    /// An offer is misconfigured.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("storage error")]
    Storage(#[source] StoreError),
}

impl From<ApplicationError> for PricingServiceError {
    fn from(error: ApplicationError) -> Self {
        match error {
            ApplicationError::Configuration(error) => Self::Configuration(error),
            ApplicationError::Voucher(error) => Self::Voucher(error),
        }
    }
}

impl From<StoreError> for PricingServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            StoreError::AlreadyExists | StoreError::LimitReached | StoreError::Unavailable(_) => {
                Self::Storage(error)
            }
        }
    }
}
