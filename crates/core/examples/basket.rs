//! Priced Basket Receipt Example
//!
//! Builds a small cart, runs a standing offer and a voucher over it and prints the receipt.

use std::io;

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rusty_money::iso::GBP;

use rebate::prelude::*;

/// Priced Basket Receipt Example
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let kitchen = CategoryUuid::new();
    let now = Timestamp::now();

    let product = |name: &str, prices: ProductPrices, category: Option<CategoryUuid>| Product {
        name: name.to_string(),
        prices,
        attributes: ProductAttributes {
            category,
            ..ProductAttributes::bare(ProductUuid::new())
        },
    };

    let mug = product("Stoneware Mug", ProductPrices::new(800), Some(kitchen));
    let teapot = product("Cast Iron Teapot", ProductPrices::discounted(3_200, 2_800), Some(kitchen));
    let tea = product("Assam Loose Leaf", ProductPrices::new(650), None);

    let mut content = CartContent::new(
        CartHeader {
            uuid: CartUuid::new(),
            session: SessionUuid::new(),
            user: Some(UserUuid::new()),
            status: CartStatus::Open,
        },
        [
            ContentLine::new(CartLineUuid::new(), mug, 3),
            ContentLine::new(CartLineUuid::new(), teapot, 1),
            ContentLine::new(CartLineUuid::new(), tea.clone(), 2),
        ],
        GBP,
    );

    let members = OfferRule {
        offer: Offer::new("Members save on kitchenware", OfferKind::User, now),
        range: Range::new(FilterMode::Union).with_categories(Dimension::including([kitchen])),
        condition: Condition::new(ConditionKind::BasketQuantity(1)),
        benefit: Benefit::new(BenefitKind::Percentage(Percentage::from(0.1))),
    };

    let tea_voucher = OfferRule {
        offer: Offer::voucher("Tea time", "TEA", now),
        range: Range::new(FilterMode::Union).with_products(Dimension::including([tea.uuid()])),
        condition: Condition::new(ConditionKind::BasketQuantity(2)),
        benefit: Benefit::new(BenefitKind::FixedAmount(150)).with_max_affected_items(1),
    };

    apply_standing_offer(&mut content, &members)?;
    apply_voucher(&mut content, &tea_voucher)?;

    write_receipt(io::stdout().lock(), &content)?;

    Ok(())
}
