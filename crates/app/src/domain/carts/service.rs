//! Carts service.

use std::sync::Arc;

use async_trait::async_trait;
use jiff::Timestamp;
use mockall::automock;
use rebate::{
    content::{CartContent, CartLineUuid, CartStatus, CartUuid, SessionUuid, UserUuid},
    merge::{CartLine, MergePolicy, reconcile},
    products::ProductUuid,
};
use tracing::{Span, info};

use crate::{
    domain::{
        carts::{
            errors::CartsServiceError,
            models::{Cart, NewCart},
        },
        pricing::PricingService,
    },
    store::Store,
};

#[derive(Clone)]
pub struct StoreCartsService {
    store: Store,
    pricing: Arc<dyn PricingService>,
    merge_policy: MergePolicy,
}

impl StoreCartsService {
    #[must_use]
    pub fn new(store: Store, pricing: Arc<dyn PricingService>, merge_policy: MergePolicy) -> Self {
        Self {
            store,
            pricing,
            merge_policy,
        }
    }

    async fn open_cart(&self, cart: CartUuid) -> Result<Cart, CartsServiceError> {
        let cart = self.store.carts.get_cart(cart).await?;

        if cart.status != CartStatus::Open {
            return Err(CartsServiceError::CartNotOpen(cart.status));
        }

        Ok(cart)
    }

    /// Fold the user's cart into the session's cart and retire the user's cart.
    async fn fold_into_session_cart(
        &self,
        user_cart: &Cart,
        session_cart: &Cart,
        user: UserUuid,
    ) -> Result<(), CartsServiceError> {
        let user_lines = self.store.carts.get_lines(user_cart.uuid).await?;
        let session_lines = self.store.carts.get_lines(session_cart.uuid).await?;

        let merged = reconcile(&user_lines, &session_lines, self.merge_policy);
        let merged_count = merged.len();

        self.store
            .carts
            .upsert_lines(session_cart.uuid, merged)
            .await?;

        self.store
            .carts
            .set_status(user_cart.uuid, CartStatus::Merged)
            .await?;

        self.store
            .carts
            .assign_user(session_cart.uuid, user)
            .await?;

        info!(
            user_cart_uuid = %user_cart.uuid,
            session_cart_uuid = %session_cart.uuid,
            merged_count,
            "merged carts"
        );

        Ok(())
    }
}

impl std::fmt::Debug for StoreCartsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCartsService")
            .field("merge_policy", &self.merge_policy)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CartsService for StoreCartsService {
    #[tracing::instrument(
        name = "carts.service.create_cart",
        skip(self, cart),
        fields(cart_uuid = %cart.uuid, session_uuid = %cart.session),
        err
    )]
    async fn create_cart(&self, cart: NewCart) -> Result<Cart, CartsServiceError> {
        let created = self.store.carts.create_cart(cart).await?;

        info!("created cart");

        Ok(created)
    }

    #[tracing::instrument(
        name = "carts.service.add_line",
        skip(self),
        fields(cart_uuid = %cart, product_uuid = %product, line_uuid = tracing::field::Empty),
        err
    )]
    async fn add_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartLine, CartsServiceError> {
        if quantity < 1 {
            return Err(CartsServiceError::InvalidQuantity(quantity));
        }

        let cart = self.open_cart(cart).await?;
        let products = self.store.products.get_products(&[product]).await?;
        let found = products.first().ok_or(CartsServiceError::NotFound)?;

        if found.prices.selling_price() == 0 {
            return Err(CartsServiceError::ProductNotPriced);
        }

        let line = CartLine {
            uuid: CartLineUuid::new(),
            product,
            quantity,
        };

        self.store.carts.insert_line(cart.uuid, line).await?;

        Span::current().record("line_uuid", tracing::field::display(line.uuid));

        info!(quantity, "added line");

        Ok(line)
    }

    #[tracing::instrument(
        name = "carts.service.update_quantity",
        skip(self),
        fields(cart_uuid = %cart, line_uuid = %line),
        err
    )]
    async fn update_quantity(
        &self,
        cart: CartUuid,
        line: CartLineUuid,
        quantity: u32,
    ) -> Result<CartLine, CartsServiceError> {
        if quantity < 1 {
            return Err(CartsServiceError::InvalidQuantity(quantity));
        }

        let cart = self.open_cart(cart).await?;

        let updated = self
            .store
            .carts
            .update_line_quantity(cart.uuid, line, quantity)
            .await?;

        info!(quantity, "updated line quantity");

        Ok(updated)
    }

    #[tracing::instrument(
        name = "carts.service.remove_line",
        skip(self),
        fields(cart_uuid = %cart, line_uuid = %line),
        err
    )]
    async fn remove_line(&self, cart: CartUuid, line: CartLineUuid) -> Result<(), CartsServiceError> {
        let cart = self.open_cart(cart).await?;

        self.store.carts.delete_line(cart.uuid, line).await?;

        info!("removed line");

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.clear_cart",
        skip(self),
        fields(cart_uuid = %cart),
        err
    )]
    async fn clear_cart(&self, cart: CartUuid) -> Result<(), CartsServiceError> {
        let cart = self.open_cart(cart).await?;

        self.store.carts.clear_lines(cart.uuid).await?;
        self.store.applied_vouchers.reset_applied(cart.uuid).await?;

        info!("cleared cart");

        Ok(())
    }

    #[tracing::instrument(
        name = "carts.service.get_cart_content",
        skip(self),
        fields(session_uuid = %session),
        err
    )]
    async fn get_cart_content(
        &self,
        session: SessionUuid,
        point_in_time: Timestamp,
    ) -> Result<CartContent, CartsServiceError> {
        Ok(self
            .pricing
            .build_cart_content(session, point_in_time)
            .await?)
    }

    #[tracing::instrument(
        name = "carts.service.merge_carts",
        skip(self),
        fields(
            user_uuid = %user,
            session_uuid = %session,
            policy = ?self.merge_policy,
            outcome = tracing::field::Empty
        ),
        err
    )]
    async fn merge_carts(
        &self,
        user: UserUuid,
        session: SessionUuid,
        point_in_time: Timestamp,
    ) -> Result<CartContent, CartsServiceError> {
        let user_cart = self.store.carts.get_open_cart_for_user(user).await?;
        let session_cart = self.store.carts.get_cart_by_session(session).await?;

        let span = Span::current();

        let priced_session = match (user_cart, session_cart) {
            (None, Some(session_cart)) => {
                span.record("outcome", "claimed_session_cart");

                self.store
                    .carts
                    .assign_user(session_cart.uuid, user)
                    .await?;

                session
            }
            (None, None) => {
                span.record("outcome", "created_cart");

                self.store
                    .carts
                    .create_cart(NewCart::for_session(session, Some(user)))
                    .await?;

                session
            }
            (Some(user_cart), None) => {
                span.record("outcome", "kept_user_cart");

                user_cart.session
            }
            (Some(user_cart), Some(session_cart)) if user_cart.uuid == session_cart.uuid => {
                span.record("outcome", "already_merged");

                session
            }
            (Some(user_cart), Some(session_cart)) => {
                span.record("outcome", "merged");

                self.fold_into_session_cart(&user_cart, &session_cart, user)
                    .await?;

                session
            }
        };

        Ok(self
            .pricing
            .build_cart_content(priced_session, point_in_time)
            .await?)
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Create an open, empty cart.
    async fn create_cart(&self, cart: NewCart) -> Result<Cart, CartsServiceError>;

    /// Add a product to an open cart. Quantity must be at least 1 and the product must
    /// have a price.
    async fn add_line(
        &self,
        cart: CartUuid,
        product: ProductUuid,
        quantity: u32,
    ) -> Result<CartLine, CartsServiceError>;

    /// Change a line's quantity. Quantity must be at least 1.
    async fn update_quantity(
        &self,
        cart: CartUuid,
        line: CartLineUuid,
        quantity: u32,
    ) -> Result<CartLine, CartsServiceError>;

    /// Remove a line from an open cart.
    async fn remove_line(&self, cart: CartUuid, line: CartLineUuid) -> Result<(), CartsServiceError>;

    /// Remove every line and detach every voucher.
    async fn clear_cart(&self, cart: CartUuid) -> Result<(), CartsServiceError>;

    /// Priced content for the session's open cart.
    async fn get_cart_content(
        &self,
        session: SessionUuid,
        point_in_time: Timestamp,
    ) -> Result<CartContent, CartsServiceError>;

    /// Merge the user's open cart into the session's open cart and price the result.
    async fn merge_carts(
        &self,
        user: UserUuid,
        session: SessionUuid,
        point_in_time: Timestamp,
    ) -> Result<CartContent, CartsServiceError>;
}

#[cfg(test)]
mod tests {
    use rebate::{
        content::ContentLine,
        offers::{Offer, OfferKind},
    };
    use testresult::TestResult;

    use crate::{
        domain::{
            carts::repository::{AppliedVouchersRepository, CartsRepository},
            pricing::{MockPricingService, PricingServiceError},
        },
        memory::MemoryStore,
        test::{
            TestContext,
            helpers::{add_line, create_cart, create_product, everything_rule},
        },
    };

    use super::*;

    fn quantities(content: &CartContent) -> Vec<(ProductUuid, u32)> {
        content
            .lines()
            .iter()
            .map(|line| (line.product_uuid(), line.quantity()))
            .collect()
    }

    #[tokio::test]
    async fn zero_quantity_is_rejected() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, SessionUuid::new(), None).await?;
        let mug = create_product(&ctx, "Mug", 1_000).await;

        let added = add_line(&ctx, &cart, mug, 0).await;

        assert!(
            matches!(added, Err(CartsServiceError::InvalidQuantity(0))),
            "expected InvalidQuantity, got {added:?}"
        );

        let line = add_line(&ctx, &cart, mug, 1).await?;
        let updated = ctx.carts.update_quantity(cart.uuid, line.uuid, 0).await;

        assert!(
            matches!(updated, Err(CartsServiceError::InvalidQuantity(0))),
            "expected InvalidQuantity, got {updated:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn unpriced_products_cannot_be_added() -> TestResult {
        let ctx = TestContext::new();
        let cart = create_cart(&ctx, SessionUuid::new(), None).await?;
        let sample = create_product(&ctx, "Free sample", 0).await;

        let result = add_line(&ctx, &cart, sample, 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::ProductNotPriced)),
            "expected ProductNotPriced, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn lines_can_be_updated_and_removed() -> TestResult {
        let ctx = TestContext::new();
        let session = SessionUuid::new();
        let cart = create_cart(&ctx, session, None).await?;
        let mug = create_product(&ctx, "Mug", 1_000).await;
        let pot = create_product(&ctx, "Teapot", 2_500).await;

        let mug_line = add_line(&ctx, &cart, mug, 1).await?;
        let pot_line = add_line(&ctx, &cart, pot, 1).await?;

        ctx.carts.update_quantity(cart.uuid, mug_line.uuid, 3).await?;
        ctx.carts.remove_line(cart.uuid, pot_line.uuid).await?;

        let content = ctx.carts.get_cart_content(session, ctx.now).await?;

        assert_eq!(quantities(&content), [(mug, 3)]);
        assert_eq!(content.subtotal(), 3_000);

        let missing = ctx.carts.remove_line(cart.uuid, pot_line.uuid).await;

        assert!(
            matches!(missing, Err(CartsServiceError::NotFound)),
            "expected NotFound, got {missing:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn clearing_a_cart_detaches_its_vouchers() -> TestResult {
        let ctx = TestContext::new();
        let session = SessionUuid::new();
        let cart = create_cart(&ctx, session, None).await?;
        let mug = create_product(&ctx, "Mug", 1_000).await;

        ctx.store
            .insert_offer(everything_rule(Offer::voucher("Save", "SAVE", ctx.now), 50))
            .await;

        add_line(&ctx, &cart, mug, 2).await?;

        ctx.pricing
            .apply_voucher_code(session, "SAVE", ctx.now)
            .await?;

        ctx.carts.clear_cart(cart.uuid).await?;

        let content = ctx.carts.get_cart_content(session, ctx.now).await?;

        assert!(content.is_empty());
        assert!(ctx.store.list_applied(cart.uuid).await?.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn merged_carts_are_closed_to_changes() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let mug = create_product(&ctx, "Mug", 1_000).await;

        let user_cart = create_cart(&ctx, SessionUuid::new(), Some(user)).await?;
        let session = SessionUuid::new();

        add_line(&ctx, &user_cart, mug, 1).await?;
        create_cart(&ctx, session, None).await?;

        ctx.carts.merge_carts(user, session, ctx.now).await?;

        let result = add_line(&ctx, &user_cart, mug, 1).await;

        assert!(
            matches!(result, Err(CartsServiceError::CartNotOpen(CartStatus::Merged))),
            "expected CartNotOpen, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn merging_sums_quantities_into_the_session_cart() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let a = create_product(&ctx, "Mug", 1_000).await;
        let b = create_product(&ctx, "Teapot", 2_500).await;

        let user_cart = create_cart(&ctx, SessionUuid::new(), Some(user)).await?;
        add_line(&ctx, &user_cart, a, 2).await?;

        let session = SessionUuid::new();
        let session_cart = create_cart(&ctx, session, None).await?;
        let session_a = add_line(&ctx, &session_cart, a, 3).await?;
        add_line(&ctx, &session_cart, b, 1).await?;

        let content = ctx.carts.merge_carts(user, session, ctx.now).await?;

        assert_eq!(quantities(&content), [(a, 5), (b, 1)]);
        assert_eq!(content.lines().first().map(ContentLine::uuid), Some(session_a.uuid));
        assert_eq!(content.user(), Some(user));

        let retired = ctx.store.get_cart(user_cart.uuid).await?;

        assert_eq!(retired.status, CartStatus::Merged);
        assert_eq!(
            ctx.store.get_open_cart_for_user(user).await?.map(|cart| cart.uuid),
            Some(session_cart.uuid)
        );

        Ok(())
    }

    #[tokio::test]
    async fn merging_can_keep_session_quantities() -> TestResult {
        let ctx = TestContext::with_merge_policy(MergePolicy::KeepSession);
        let user = UserUuid::new();
        let a = create_product(&ctx, "Mug", 1_000).await;

        let user_cart = create_cart(&ctx, SessionUuid::new(), Some(user)).await?;
        add_line(&ctx, &user_cart, a, 2).await?;

        let session = SessionUuid::new();
        let session_cart = create_cart(&ctx, session, None).await?;
        add_line(&ctx, &session_cart, a, 3).await?;

        let content = ctx.carts.merge_carts(user, session, ctx.now).await?;

        assert_eq!(quantities(&content), [(a, 3)]);

        Ok(())
    }

    #[tokio::test]
    async fn merging_applies_the_users_standing_offers() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let a = create_product(&ctx, "Mug", 1_000).await;

        ctx.store
            .insert_offer(everything_rule(
                Offer::new("Members", OfferKind::User, ctx.now),
                100,
            ))
            .await;

        let session = SessionUuid::new();
        let session_cart = create_cart(&ctx, session, None).await?;
        add_line(&ctx, &session_cart, a, 1).await?;

        let before = ctx.carts.get_cart_content(session, ctx.now).await?;
        let after = ctx.carts.merge_carts(user, session, ctx.now).await?;

        assert_eq!(before.total_offer_discount(), 0);
        assert_eq!(after.total_offer_discount(), 100);

        Ok(())
    }

    #[tokio::test]
    async fn merging_empty_carts_hands_the_session_to_the_user() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let session = SessionUuid::new();

        let user_cart = create_cart(&ctx, SessionUuid::new(), Some(user)).await?;
        let session_cart = create_cart(&ctx, session, None).await?;

        let content = ctx.carts.merge_carts(user, session, ctx.now).await?;

        assert!(content.is_empty());
        assert_eq!(content.cart_uuid(), session_cart.uuid);
        assert_eq!(content.user(), Some(user));
        assert_eq!(ctx.store.get_cart(user_cart.uuid).await?.status, CartStatus::Merged);

        Ok(())
    }

    #[tokio::test]
    async fn merging_without_carts_creates_one() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let session = SessionUuid::new();

        let content = ctx.carts.merge_carts(user, session, ctx.now).await?;

        assert!(content.is_empty());
        assert_eq!(content.user(), Some(user));
        assert_eq!(content.header().session, session);

        Ok(())
    }

    #[tokio::test]
    async fn merging_without_a_session_cart_keeps_the_user_cart() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let a = create_product(&ctx, "Mug", 1_000).await;

        let user_cart = create_cart(&ctx, SessionUuid::new(), Some(user)).await?;
        add_line(&ctx, &user_cart, a, 2).await?;

        let content = ctx
            .carts
            .merge_carts(user, SessionUuid::new(), ctx.now)
            .await?;

        assert_eq!(content.cart_uuid(), user_cart.uuid);
        assert_eq!(quantities(&content), [(a, 2)]);

        Ok(())
    }

    #[tokio::test]
    async fn merging_a_cart_with_itself_changes_nothing() -> TestResult {
        let ctx = TestContext::new();
        let user = UserUuid::new();
        let a = create_product(&ctx, "Mug", 1_000).await;
        let session = SessionUuid::new();

        let cart = create_cart(&ctx, session, Some(user)).await?;
        add_line(&ctx, &cart, a, 2).await?;

        let content = ctx.carts.merge_carts(user, session, ctx.now).await?;

        assert_eq!(quantities(&content), [(a, 2)]);
        assert_eq!(ctx.store.get_cart(cart.uuid).await?.status, CartStatus::Open);

        Ok(())
    }

    #[tokio::test]
    async fn pricing_failures_surface_from_merges() -> TestResult {
        let store = Arc::new(MemoryStore::new());

        let mut pricing = MockPricingService::new();

        pricing
            .expect_build_cart_content()
            .returning(|_, _| Err(PricingServiceError::NotFound));

        let carts = StoreCartsService::new(
            Store::memory(&store),
            Arc::new(pricing),
            MergePolicy::SumQuantities,
        );

        let result = carts
            .merge_carts(UserUuid::new(), SessionUuid::new(), Timestamp::now())
            .await;

        assert!(
            matches!(result, Err(CartsServiceError::Pricing(PricingServiceError::NotFound))),
            "expected Pricing(NotFound), got {result:?}"
        );

        Ok(())
    }
}
