//! In-memory Store
//!
//! Implements every collaborator over maps guarded by one [`RwLock`]. Each operation takes
//! the lock once, so multi-record writes such as usage adjustments are atomic.

use jiff::Timestamp;
use rebate::{
    content::{CartUuid, UserUuid},
    merge::CartLine,
    offers::{OfferRule, OfferUuid},
    products::{Product, ProductUuid},
};
use rustc_hash::FxHashMap;
use tokio::sync::RwLock;

use crate::domain::carts::models::Cart;

mod carts;
mod offers;
mod products;

#[derive(Debug, Default)]
struct Tables {
    products: FxHashMap<ProductUuid, Product>,
    offers: FxHashMap<OfferUuid, OfferRule>,
    usages: FxHashMap<(OfferUuid, UserUuid), u64>,
    carts: FxHashMap<CartUuid, Cart>,
    lines: FxHashMap<CartUuid, Vec<CartLine>>,
    applied_vouchers: FxHashMap<CartUuid, Vec<OfferUuid>>,
}

/// In-memory collaborator implementations.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a catalogue product.
    pub async fn insert_product(&self, product: Product) {
        self.tables
            .write()
            .await
            .products
            .insert(product.uuid(), product);
    }

    /// Add or replace an offer.
    pub async fn insert_offer(&self, rule: OfferRule) {
        self.tables.write().await.offers.insert(rule.uuid(), rule);
    }

    /// Seed a user's redemption count for an offer.
    pub async fn set_user_usage(&self, offer: OfferUuid, user: UserUuid, usage_count: u64) {
        self.tables
            .write()
            .await
            .usages
            .insert((offer, user), usage_count);
    }

    /// Global redemption count of an offer.
    pub async fn usage_count(&self, offer: OfferUuid) -> Option<u64> {
        self.tables
            .read()
            .await
            .offers
            .get(&offer)
            .map(|rule| rule.offer.usage_count)
    }
}

fn touch(cart: &mut Cart) {
    cart.updated_at = Timestamp::now();
}
