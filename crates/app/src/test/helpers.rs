//! Test Helpers

use rebate::{
    benefits::{Benefit, BenefitKind},
    conditions::{Condition, ConditionKind},
    content::{SessionUuid, UserUuid},
    merge::CartLine,
    offers::{Offer, OfferRule},
    products::{Product, ProductAttributes, ProductPrices, ProductUuid},
    ranges::{Dimension, FilterMode, Range},
};

use crate::{
    domain::carts::{
        CartsService, CartsServiceError,
        models::{Cart, NewCart},
    },
    test::TestContext,
};

/// An offer taking `fixed_amount` off every unit of every product.
pub(crate) fn everything_rule(offer: Offer, fixed_amount: u64) -> OfferRule {
    OfferRule {
        offer,
        range: Range::new(FilterMode::Union).with_products(Dimension::all()),
        condition: Condition::new(ConditionKind::BasketQuantity(1)),
        benefit: Benefit::new(BenefitKind::FixedAmount(fixed_amount)),
    }
}

pub(crate) async fn create_product(ctx: &TestContext, name: &str, price: u64) -> ProductUuid {
    let uuid = ProductUuid::new();

    ctx.store
        .insert_product(Product {
            name: name.to_string(),
            prices: ProductPrices::new(price),
            attributes: ProductAttributes::bare(uuid),
        })
        .await;

    uuid
}

pub(crate) async fn create_cart(
    ctx: &TestContext,
    session: SessionUuid,
    user: Option<UserUuid>,
) -> Result<Cart, CartsServiceError> {
    ctx.carts
        .create_cart(NewCart::for_session(session, user))
        .await
}

pub(crate) async fn add_line(
    ctx: &TestContext,
    cart: &Cart,
    product: ProductUuid,
    quantity: u32,
) -> Result<CartLine, CartsServiceError> {
    ctx.carts.add_line(cart.uuid, product, quantity).await
}
