//! Offers Repositories

use async_trait::async_trait;
use mockall::automock;
use rebate::{
    content::UserUuid,
    offers::{OfferKind, OfferRule, OfferUuid},
};
use rustc_hash::FxHashMap;

use crate::store::StoreError;

/// Direction of a usage adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageAdjustment {
    /// Count one redemption.
    Increment,

    /// Reverse one redemption, never dropping below zero.
    Decrement,
}

/// Resolved offer lookup. Rules come back with range, condition and benefit joined.
#[automock]
#[async_trait]
pub trait OffersRepository: Send + Sync {
    /// Fetch one offer by id.
    async fn get_offer(&self, offer: OfferUuid) -> Result<OfferRule, StoreError>;

    /// Fetch the voucher redeemed with `code`.
    async fn get_offer_by_voucher_code(&self, code: &str) -> Result<OfferRule, StoreError>;

    /// Fetch every offer of one type.
    async fn get_offers_of_kind(&self, kind: OfferKind) -> Result<Vec<OfferRule>, StoreError>;
}

/// Redemption counters.
#[automock]
#[async_trait]
pub trait UsagesRepository: Send + Sync {
    /// The user's redemptions of one offer. Zero when none are recorded.
    async fn get_user_usage(&self, offer: OfferUuid, user: UserUuid) -> Result<u64, StoreError>;

    /// The user's redemptions of every offer they have used.
    async fn get_user_usages(&self, user: UserUuid)
    -> Result<FxHashMap<OfferUuid, u64>, StoreError>;

    /// Apply one adjustment to the (offer, user) counter and the global counter of every
    /// listed offer. Either every offer is adjusted or none is.
    async fn adjust_usages(
        &self,
        offers: &[OfferUuid],
        user: UserUuid,
        adjustment: UsageAdjustment,
    ) -> Result<(), StoreError>;
}
