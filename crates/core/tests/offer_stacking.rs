//! Integration tests for stacking standing offers and vouchers on cart content

use decimal_percentage::Percentage;
use jiff::Timestamp;
use rusty_money::iso::GBP;
use testresult::TestResult;

use rebate::prelude::*;

struct Catalogue {
    mug: Product,
    teapot: Product,
    biscuits: Product,
}

impl Catalogue {
    fn new() -> Self {
        let product = |name: &str, prices: ProductPrices| Product {
            name: name.to_string(),
            prices,
            attributes: ProductAttributes::bare(ProductUuid::new()),
        };

        Self {
            mug: product("Mug", ProductPrices::new(800)),
            teapot: product("Teapot", ProductPrices::discounted(3_000, 2_500)),
            biscuits: product("Biscuits", ProductPrices::new(250)),
        }
    }
}

fn build(catalogue: &Catalogue, user: Option<UserUuid>) -> CartContent {
    let lines = [
        ContentLine::new(CartLineUuid::new(), catalogue.mug.clone(), 3),
        ContentLine::new(CartLineUuid::new(), catalogue.teapot.clone(), 1),
        ContentLine::new(CartLineUuid::new(), catalogue.biscuits.clone(), 4),
    ];

    CartContent::new(
        CartHeader {
            uuid: CartUuid::new(),
            session: SessionUuid::new(),
            user,
            status: CartStatus::Open,
        },
        lines,
        GBP,
    )
}

fn everything(offer: Offer, threshold: u32, benefit: Benefit) -> OfferRule {
    OfferRule {
        offer,
        range: Range::new(FilterMode::Union).with_products(Dimension::all()),
        condition: Condition::new(ConditionKind::BasketQuantity(threshold)),
        benefit,
    }
}

fn price(
    catalogue: &Catalogue,
    user: UserUuid,
    standing: &[OfferRule],
    vouchers: &[OfferRule],
) -> TestResult<CartContent> {
    let mut content = build(catalogue, Some(user));
    let now = Timestamp::now();

    for rule in standing_offers(standing, user, now, &Default::default()) {
        apply_standing_offer(&mut content, rule)?;
    }

    for rule in vouchers {
        let context = VoucherContext {
            user: Some(user),
            now,
            user_usage: 0,
            already_applied: false,
        };

        if validate_voucher(rule, &context).is_ok() {
            // Vouchers that no longer apply are dropped, not fatal.
            let _outcome = apply_voucher(&mut content, rule);
        }
    }

    Ok(content)
}

fn assert_invariants(content: &CartContent) {
    let line_sum: u64 = content
        .lines()
        .iter()
        .map(ContentLine::total_offer_discount)
        .sum();

    assert_eq!(
        content.total_offer_discount(),
        line_sum,
        "cart total must equal the sum of line totals"
    );

    for line in content.lines() {
        assert!(
            line.total_offer_discount() <= line.value(),
            "line {} discounted beyond its value",
            line.name()
        );
    }
}

fn offers(now: Timestamp) -> (Vec<OfferRule>, Vec<OfferRule>) {
    let standing = vec![
        everything(
            Offer {
                priority: 5,
                ..Offer::new("Loyal customer", OfferKind::User, now)
            },
            1,
            Benefit::new(BenefitKind::Percentage(Percentage::from(0.2))),
        ),
        everything(
            Offer::new("Big spender", OfferKind::User, now),
            3,
            Benefit::new(BenefitKind::FixedAmount(700)),
        ),
    ];

    let vouchers = vec![
        everything(
            Offer::voucher("Half off", "HALF", now),
            1,
            Benefit::new(BenefitKind::Percentage(Percentage::from(0.5))),
        ),
        everything(
            Offer::voucher("Two quid", "TWO", now),
            1,
            Benefit::new(BenefitKind::FixedAmount(200)).with_max_affected_items(2),
        ),
    ];

    (standing, vouchers)
}

#[test]
fn rebuilding_from_the_same_state_is_idempotent() -> TestResult {
    let catalogue = Catalogue::new();
    let user = UserUuid::new();
    let (standing, vouchers) = offers(Timestamp::now());

    let first = price(&catalogue, user, &standing, &vouchers)?;
    let second = price(&catalogue, user, &standing, &vouchers)?;

    assert_eq!(first.total_offer_discount(), second.total_offer_discount());

    let amounts = |content: &CartContent| -> Vec<(String, u64)> {
        content
            .standing_discounts()
            .iter()
            .chain(content.voucher_discounts())
            .map(|entry| (entry.name.clone(), entry.amount))
            .collect()
    };

    assert_eq!(amounts(&first), amounts(&second));

    Ok(())
}

#[test]
fn stacked_discounts_respect_the_clamp_in_every_order() -> TestResult {
    let catalogue = Catalogue::new();
    let user = UserUuid::new();
    let (standing, vouchers) = offers(Timestamp::now());

    let reversed: Vec<OfferRule> = vouchers.iter().rev().cloned().collect();

    for vouchers in [&vouchers, &reversed] {
        let content = price(&catalogue, user, &standing, vouchers)?;

        assert_invariants(&content);
        assert!(content.total() <= content.subtotal(), "total exceeds subtotal");
    }

    Ok(())
}

#[test]
fn standing_offers_apply_before_vouchers_in_priority_order() -> TestResult {
    let catalogue = Catalogue::new();
    let user = UserUuid::new();
    let (standing, vouchers) = offers(Timestamp::now());

    let content = price(&catalogue, user, &standing, &vouchers)?;

    let standing_names: Vec<&str> = content
        .standing_discounts()
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();

    // Loyal customer (priority 5) touches all three lines before Big spender.
    assert_eq!(
        standing_names.first().copied(),
        Some("Loyal customer"),
        "highest priority applies first"
    );

    let mug = content.line(0).ok_or("missing mug")?;

    // Mug: 3 × 800 = 2400. 20% = 480, then 700 × 3 = 2100 clamped to 1920.
    assert_eq!(mug.standing_discounts().len(), 2);
    assert_eq!(mug.remaining_value(), 0);
    assert!(
        mug.voucher_discounts().is_empty(),
        "fully discounted lines take no voucher discount"
    );

    assert_invariants(&content);

    Ok(())
}

#[test]
fn teapot_is_discounted_from_its_selling_price() -> TestResult {
    let catalogue = Catalogue::new();
    let mut content = build(&catalogue, None);

    let rule = OfferRule {
        offer: Offer::voucher("Teapot tenth", "TEA", Timestamp::now()),
        range: Range::new(FilterMode::Union)
            .with_products(Dimension::including([catalogue.teapot.uuid()])),
        condition: Condition::new(ConditionKind::BasketQuantity(1)),
        benefit: Benefit::new(BenefitKind::Percentage(Percentage::from(0.1))),
    };

    assert_eq!(apply_voucher(&mut content, &rule)?, 250);

    Ok(())
}

#[test]
fn max_affected_items_caps_the_discounted_units() -> TestResult {
    let product = ProductUuid::new();
    let mut content = CartContent::new(
        CartHeader {
            uuid: CartUuid::new(),
            session: SessionUuid::new(),
            user: None,
            status: CartStatus::Open,
        },
        [ContentLine::new(
            CartLineUuid::new(),
            Product {
                name: "Pen".to_string(),
                prices: ProductPrices::new(100),
                attributes: ProductAttributes::bare(product),
            },
            5,
        )],
        GBP,
    );

    let rule = OfferRule {
        offer: Offer::voucher("Ten off two", "PENS", Timestamp::now()),
        range: Range::new(FilterMode::Union).with_products(Dimension::including([product])),
        condition: Condition::new(ConditionKind::BasketQuantity(1)),
        benefit: Benefit::new(BenefitKind::FixedAmount(10)).with_max_affected_items(2),
    };

    assert_eq!(apply_voucher(&mut content, &rule)?, 20);
    assert_eq!(content.total_offer_discount(), 20);

    Ok(())
}

#[test]
fn exhausted_voucher_is_rejected_regardless_of_per_user_limit() {
    let now = Timestamp::now();

    let rule = everything(
        Offer {
            limits: UsageLimits {
                per_user: None,
                overall: Some(1),
            },
            usage_count: 1,
            ..Offer::voucher("Once only", "ONCE", now)
        },
        1,
        Benefit::new(BenefitKind::FixedAmount(100)),
    );

    for user_usage in [0, 5] {
        let context = VoucherContext {
            user: Some(UserUuid::new()),
            now,
            user_usage,
            already_applied: false,
        };

        assert_eq!(
            validate_voucher(&rule, &context),
            Err(VoucherError::OverallLimitReached)
        );
    }
}
