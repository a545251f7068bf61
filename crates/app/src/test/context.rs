//! Test context for service-level tests.

use std::sync::Arc;

use jiff::Timestamp;
use rebate::merge::MergePolicy;
use rusty_money::iso::GBP;

use crate::{
    domain::{carts::StoreCartsService, offers::StoreOffersService, pricing::StorePricingService},
    memory::MemoryStore,
    store::Store,
};

pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub offers: StoreOffersService,
    pub pricing: StorePricingService,
    pub carts: StoreCartsService,
    pub now: Timestamp,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_merge_policy(MergePolicy::SumQuantities)
    }

    pub fn with_merge_policy(policy: MergePolicy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let handles = Store::memory(&store);
        let pricing = StorePricingService::new(handles.clone(), GBP);

        Self {
            offers: StoreOffersService::new(handles.clone()),
            carts: StoreCartsService::new(handles, Arc::new(pricing.clone()), policy),
            pricing,
            store,
            now: Timestamp::now(),
        }
    }

    /// Collaborator handles over this context's in-memory store.
    pub fn store(&self) -> Store {
        Store::memory(&self.store)
    }
}
