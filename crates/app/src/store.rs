//! Store
//!
//! The collaborators the services read from and write to, bundled so each service can be
//! built from one value.

use std::sync::Arc;

use thiserror::Error;

use crate::{
    domain::{
        carts::repository::{AppliedVouchersRepository, CartsRepository},
        offers::repository::{OffersRepository, UsagesRepository},
        products::ProductsRepository,
    },
    memory::MemoryStore,
};

/// Errors reported by a collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested record does not exist.
    #[error("record not found")]
    NotFound,

    /// A record with the same key already exists.
    #[error("record already exists")]
    AlreadyExists,

    /// The write would take a counter past its limit.
    #[error("limit reached")]
    LimitReached,

    /// The backing store failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Handles to every collaborator.
#[derive(Clone)]
pub struct Store {
    pub products: Arc<dyn ProductsRepository>,
    pub offers: Arc<dyn OffersRepository>,
    pub usages: Arc<dyn UsagesRepository>,
    pub applied_vouchers: Arc<dyn AppliedVouchersRepository>,
    pub carts: Arc<dyn CartsRepository>,
}

impl Store {
    /// Route every collaborator to one in-memory store.
    #[must_use]
    pub fn memory(store: &Arc<MemoryStore>) -> Self {
        Self {
            products: store.clone(),
            offers: store.clone(),
            usages: store.clone(),
            applied_vouchers: store.clone(),
            carts: store.clone(),
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}
