//! App Context

use std::sync::Arc;

use rebate::merge::MergePolicy;
use rusty_money::iso::Currency;

use crate::{
    domain::{
        carts::{CartsService, StoreCartsService},
        offers::{OffersService, StoreOffersService},
        pricing::{PricingService, StorePricingService},
    },
    store::Store,
};

#[derive(Clone)]
pub struct AppContext {
    pub offers: Arc<dyn OffersService>,
    pub pricing: Arc<dyn PricingService>,
    pub carts: Arc<dyn CartsService>,
}

impl AppContext {
    /// Wire every service over one set of collaborators.
    #[must_use]
    pub fn new(store: Store, currency: &'static Currency, merge_policy: MergePolicy) -> Self {
        let pricing: Arc<dyn PricingService> =
            Arc::new(StorePricingService::new(store.clone(), currency));

        Self {
            offers: Arc::new(StoreOffersService::new(store.clone())),
            carts: Arc::new(StoreCartsService::new(store, pricing.clone(), merge_policy)),
            pricing,
        }
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}
