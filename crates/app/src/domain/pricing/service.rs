//! Pricing service.
//!
//! Builds cart content from storage and runs the offer pipeline over it: standing offers
//! for the cart's user first, then every voucher still attached to the cart. Voucher
//! attachments are re-earned on every build, so nothing is cached between
//! builds and rebuilding from the same state yields the same content.

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rebate::{
    application::{apply_standing_offer, apply_voucher},
    content::{CartContent, ContentLine, SessionUuid, UserUuid},
    offers::{OfferKind, OfferRule, standing_offers},
    products::{Product, ProductUuid},
    usage::{VoucherContext, validate_voucher},
};
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use tracing::{Span, debug, info, warn};

use crate::{
    domain::{carts::models::Cart, pricing::errors::PricingServiceError},
    store::Store,
};

#[derive(Debug, Clone)]
pub struct StorePricingService {
    store: Store,
    currency: &'static Currency,
}

impl StorePricingService {
    #[must_use]
    pub fn new(store: Store, currency: &'static Currency) -> Self {
        Self { store, currency }
    }

    async fn open_cart(&self, session: SessionUuid) -> Result<Cart, PricingServiceError> {
        self.store
            .carts
            .get_cart_by_session(session)
            .await?
            .ok_or(PricingServiceError::NotFound)
    }

    /// Undiscounted content for a cart.
    async fn base_content(&self, cart: &Cart) -> Result<CartContent, PricingServiceError> {
        let lines = self.store.carts.get_lines(cart.uuid).await?;

        let product_uuids: Vec<ProductUuid> = lines.iter().map(|line| line.product).collect();

        let products: FxHashMap<ProductUuid, Product> = if product_uuids.is_empty() {
            FxHashMap::default()
        } else {
            self.store
                .products
                .get_products(&product_uuids)
                .await?
                .into_iter()
                .map(|product| (product.uuid(), product))
                .collect()
        };

        let content_lines = lines
            .iter()
            .map(|line| {
                products
                    .get(&line.product)
                    .cloned()
                    .map(|product| ContentLine::new(line.uuid, product, line.quantity))
                    .ok_or(PricingServiceError::NotFound)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CartContent::new(cart.header(), content_lines, self.currency))
    }

    async fn apply_standing_offers(
        &self,
        content: &mut CartContent,
        user: UserUuid,
        point_in_time: Timestamp,
    ) -> Result<(), PricingServiceError> {
        let rules = self.store.offers.get_offers_of_kind(OfferKind::User).await?;
        let usage = self.store.usages.get_user_usages(user).await?;

        for rule in standing_offers(&rules, user, point_in_time, &usage) {
            let outcome = apply_standing_offer(content, rule)?;

            debug!(offer_uuid = %rule.uuid(), ?outcome, "ran standing offer");
        }

        Ok(())
    }

    /// Validate a voucher against the cart and apply it. Attachment is left to the caller.
    async fn redeem(
        &self,
        content: &mut CartContent,
        rule: &OfferRule,
        point_in_time: Timestamp,
        already_applied: bool,
    ) -> Result<u64, PricingServiceError> {
        let user = content.user();

        let user_usage = match user {
            Some(user) => self.store.usages.get_user_usage(rule.uuid(), user).await?,
            None => 0,
        };

        validate_voucher(
            rule,
            &VoucherContext {
                user,
                now: point_in_time,
                user_usage,
                already_applied,
            },
        )?;

        Ok(apply_voucher(content, rule)?)
    }

    /// Price a cart from scratch.
    ///
    /// Attached vouchers are re-earned against fresh content. The attachment set is only
    /// rewritten once every voucher has been processed, so a failed build leaves it intact.
    async fn price_cart(
        &self,
        cart: &Cart,
        point_in_time: Timestamp,
    ) -> Result<CartContent, PricingServiceError> {
        let mut content = self.base_content(cart).await?;

        if let Some(user) = cart.user {
            self.apply_standing_offers(&mut content, user, point_in_time)
                .await?;
        }

        let attached = self.store.applied_vouchers.list_applied(cart.uuid).await?;
        let mut kept = Vec::with_capacity(attached.len());

        for offer in &attached {
            let result = match self.store.offers.get_offer(*offer).await {
                Ok(rule) => self.redeem(&mut content, &rule, point_in_time, false).await,
                Err(error) => Err(error.into()),
            };

            match result {
                Ok(amount) => {
                    debug!(offer_uuid = %offer, amount, "reapplied voucher");
                    kept.push(*offer);
                }
                Err(PricingServiceError::Voucher(reason)) => {
                    warn!(offer_uuid = %offer, %reason, "dropped voucher from cart");
                }
                Err(PricingServiceError::NotFound) => {
                    warn!(offer_uuid = %offer, "dropped unknown voucher from cart");
                }
                Err(error) => return Err(error),
            }
        }

        if kept != attached {
            self.store
                .applied_vouchers
                .replace_applied(cart.uuid, kept)
                .await?;
        }

        let span = Span::current();

        span.record("line_count", content.len());
        span.record("total_offer_discount", content.total_offer_discount());

        Ok(content)
    }
}

#[async_trait]
impl PricingService for StorePricingService {
    #[tracing::instrument(
        name = "pricing.service.build_cart_content",
        skip(self),
        fields(
            session_uuid = %session,
            line_count = tracing::field::Empty,
            total_offer_discount = tracing::field::Empty
        ),
        err
    )]
    async fn build_cart_content(
        &self,
        session: SessionUuid,
        point_in_time: Timestamp,
    ) -> Result<CartContent, PricingServiceError> {
        let cart = self.open_cart(session).await?;

        self.price_cart(&cart, point_in_time).await
    }

    #[tracing::instrument(
        name = "pricing.service.apply_voucher_code",
        skip(self, code),
        fields(
            session_uuid = %session,
            line_count = tracing::field::Empty,
            total_offer_discount = tracing::field::Empty
        ),
        err
    )]
    async fn apply_voucher_code(
        &self,
        session: SessionUuid,
        code: &str,
        point_in_time: Timestamp,
    ) -> Result<CartContent, PricingServiceError> {
        let cart = self.open_cart(session).await?;
        let mut content = self.price_cart(&cart, point_in_time).await?;

        let rule = self.store.offers.get_offer_by_voucher_code(code).await?;

        let already_applied = self
            .store
            .applied_vouchers
            .is_applied(cart.uuid, rule.uuid())
            .await?;

        let amount = self
            .redeem(&mut content, &rule, point_in_time, already_applied)
            .await?;

        self.store
            .applied_vouchers
            .insert_applied(cart.uuid, rule.uuid())
            .await?;

        info!(cart_uuid = %cart.uuid, offer_uuid = %rule.uuid(), amount, "applied voucher");

        Ok(content)
    }

    #[tracing::instrument(
        name = "pricing.service.remove_voucher_code",
        skip(self, code),
        fields(
            session_uuid = %session,
            line_count = tracing::field::Empty,
            total_offer_discount = tracing::field::Empty
        ),
        err
    )]
    async fn remove_voucher_code(
        &self,
        session: SessionUuid,
        code: &str,
        point_in_time: Timestamp,
    ) -> Result<CartContent, PricingServiceError> {
        let cart = self.open_cart(session).await?;
        let rule = self.store.offers.get_offer_by_voucher_code(code).await?;

        self.store
            .applied_vouchers
            .delete_applied(cart.uuid, rule.uuid())
            .await?;

        info!(cart_uuid = %cart.uuid, offer_uuid = %rule.uuid(), "removed voucher");

        self.price_cart(&cart, point_in_time).await
    }
}

#[automock]
#[async_trait]
pub trait PricingService: Send + Sync {
    /// Build priced content for the session's open cart.
    ///
    /// Vouchers that no longer validate or apply are dropped from the cart and logged.
    /// Misconfigured offers fail the build.
    async fn build_cart_content(
        &self,
        session: SessionUuid,
        point_in_time: Timestamp,
    ) -> Result<CartContent, PricingServiceError>;

    /// Redeem a voucher code against the session's open cart. Every failure is returned.
    async fn apply_voucher_code(
        &self,
        session: SessionUuid,
        code: &str,
        point_in_time: Timestamp,
    ) -> Result<CartContent, PricingServiceError>;

    /// Detach a voucher code from the session's open cart and reprice it.
    async fn remove_voucher_code(
        &self,
        session: SessionUuid,
        code: &str,
        point_in_time: Timestamp,
    ) -> Result<CartContent, PricingServiceError>;
}
