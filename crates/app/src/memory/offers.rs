//! Offers and usage counters

use async_trait::async_trait;
use rebate::{
    content::UserUuid,
    offers::{OfferKind, OfferRule, OfferUuid},
    usage::OfferUsage,
};
use rustc_hash::FxHashMap;

use crate::{
    domain::offers::repository::{OffersRepository, UsageAdjustment, UsagesRepository},
    store::StoreError,
};

use super::MemoryStore;

#[async_trait]
impl OffersRepository for MemoryStore {
    async fn get_offer(&self, offer: OfferUuid) -> Result<OfferRule, StoreError> {
        self.tables
            .read()
            .await
            .offers
            .get(&offer)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_offer_by_voucher_code(&self, code: &str) -> Result<OfferRule, StoreError> {
        self.tables
            .read()
            .await
            .offers
            .values()
            .find(|rule| {
                rule.offer.kind == OfferKind::Voucher
                    && rule.offer.voucher_code.as_deref() == Some(code)
            })
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_offers_of_kind(&self, kind: OfferKind) -> Result<Vec<OfferRule>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .offers
            .values()
            .filter(|rule| rule.offer.kind == kind)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl UsagesRepository for MemoryStore {
    async fn get_user_usage(&self, offer: OfferUuid, user: UserUuid) -> Result<u64, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .usages
            .get(&(offer, user))
            .copied()
            .unwrap_or_default())
    }

    async fn get_user_usages(
        &self,
        user: UserUuid,
    ) -> Result<FxHashMap<OfferUuid, u64>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .usages
            .iter()
            .filter(|((_, usage_user), _)| *usage_user == user)
            .map(|((offer, _), count)| (*offer, *count))
            .collect())
    }

    async fn adjust_usages(
        &self,
        offers: &[OfferUuid],
        user: UserUuid,
        adjustment: UsageAdjustment,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        // (global count, user's count) per offer, committed only if every step succeeds.
        let mut staged: FxHashMap<OfferUuid, (u64, u64)> = FxHashMap::default();

        for offer in offers {
            let rule = tables.offers.get(offer).ok_or(StoreError::NotFound)?;

            let (usage_count, user_count) = staged.entry(*offer).or_insert_with(|| {
                (
                    rule.offer.usage_count,
                    tables.usages.get(&(*offer, user)).copied().unwrap_or_default(),
                )
            });

            let mut usage = OfferUsage {
                offer: *offer,
                user,
                usage_count: *user_count,
            };

            match adjustment {
                UsageAdjustment::Increment => {
                    let limits = &rule.offer.limits;
                    let exhausted = limits.overall_reached(*usage_count)
                        || limits.per_user_reached(*user_count);

                    if exhausted {
                        return Err(StoreError::LimitReached);
                    }

                    usage.increment();
                    *usage_count = usage_count.saturating_add(1);
                }
                UsageAdjustment::Decrement => {
                    usage.decrement();
                    *usage_count = usage_count.saturating_sub(1);
                }
            }

            *user_count = usage.usage_count;
        }

        for (offer, (usage_count, user_count)) in staged {
            if let Some(rule) = tables.offers.get_mut(&offer) {
                rule.offer.usage_count = usage_count;
            }

            tables.usages.insert((offer, user), user_count);
        }

        Ok(())
    }
}
