//! Offers service errors.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum OffersServiceError {
    #[error("offer not found")]
    NotFound,

    /// An offer's overall or per-user redemption limit is used up.
    #[error("offer usage limit reached")]
    UsageLimitReached,

    #[error("storage error")]
    Storage(#[source] StoreError),
}

impl From<StoreError> for OffersServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound => Self::NotFound,
            StoreError::LimitReached => Self::UsageLimitReached,
            StoreError::AlreadyExists | StoreError::Unavailable(_) => Self::Storage(error),
        }
    }
}
