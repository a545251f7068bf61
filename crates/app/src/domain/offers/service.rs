//! Offers service.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rebate::{
    content::UserUuid,
    offers::{OfferKind, OfferRule, OfferUuid, standing_offers},
};
use tracing::{Span, info};

use crate::{
    domain::offers::{errors::OffersServiceError, repository::UsageAdjustment},
    store::Store,
};

#[derive(Debug, Clone)]
pub struct StoreOffersService {
    store: Store,
}

impl StoreOffersService {
    #[must_use]
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    async fn adjust(
        &self,
        offers: &[OfferUuid],
        user: UserUuid,
        adjustment: UsageAdjustment,
    ) -> Result<(), OffersServiceError> {
        if offers.is_empty() {
            return Ok(());
        }

        self.store
            .usages
            .adjust_usages(offers, user, adjustment)
            .await?;

        info!(offer_count = offers.len(), ?adjustment, "adjusted offer usage");

        Ok(())
    }
}

#[async_trait]
impl OffersService for StoreOffersService {
    #[tracing::instrument(
        name = "offers.service.standing_offers",
        skip(self),
        fields(user_uuid = %user, offer_count = tracing::field::Empty),
        err
    )]
    async fn standing_offers(
        &self,
        user: UserUuid,
        point_in_time: Timestamp,
    ) -> Result<Vec<OfferRule>, OffersServiceError> {
        let rules = self.store.offers.get_offers_of_kind(OfferKind::User).await?;
        let usage = self.store.usages.get_user_usages(user).await?;

        let selected: Vec<OfferRule> = standing_offers(&rules, user, point_in_time, &usage)
            .into_iter()
            .cloned()
            .collect();

        Span::current().record("offer_count", selected.len());

        Ok(selected)
    }

    #[tracing::instrument(
        name = "offers.service.increment_usage",
        skip(self, offers),
        fields(user_uuid = %user),
        err
    )]
    async fn increment_usage(
        &self,
        offers: &[OfferUuid],
        user: UserUuid,
    ) -> Result<(), OffersServiceError> {
        self.adjust(offers, user, UsageAdjustment::Increment).await
    }

    #[tracing::instrument(
        name = "offers.service.decrement_usage",
        skip(self, offers),
        fields(user_uuid = %user),
        err
    )]
    async fn decrement_usage(
        &self,
        offers: &[OfferUuid],
        user: UserUuid,
    ) -> Result<(), OffersServiceError> {
        self.adjust(offers, user, UsageAdjustment::Decrement).await
    }
}

#[automock]
#[async_trait]
pub trait OffersService: Send + Sync {
    /// Standing offers available to a user, in application order.
    async fn standing_offers(
        &self,
        user: UserUuid,
        point_in_time: Timestamp,
    ) -> Result<Vec<OfferRule>, OffersServiceError>;

    /// Count one redemption of each offer, typically on order confirmation.
    async fn increment_usage(
        &self,
        offers: &[OfferUuid],
        user: UserUuid,
    ) -> Result<(), OffersServiceError>;

    /// Reverse one redemption of each offer, typically on order cancellation.
    async fn decrement_usage(
        &self,
        offers: &[OfferUuid],
        user: UserUuid,
    ) -> Result<(), OffersServiceError>;
}
