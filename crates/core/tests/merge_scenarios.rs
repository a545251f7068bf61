//! Integration tests for reconciling a user cart into a session cart

use rebate::prelude::*;

fn line(product: ProductUuid, quantity: u32) -> CartLine {
    CartLine {
        uuid: CartLineUuid::new(),
        product,
        quantity,
    }
}

fn quantity_of(merged: &[MergedLine], product: ProductUuid) -> Option<u32> {
    merged
        .iter()
        .find(|line| line.product == product)
        .map(|line| line.quantity)
}

#[test]
fn summing_policy_adds_user_quantities_to_session_lines() {
    let a = ProductUuid::new();
    let b = ProductUuid::new();

    let session_a = line(a, 3);
    let session_b = line(b, 1);

    let merged = reconcile(
        &[line(a, 2)],
        &[session_a, session_b],
        MergePolicy::SumQuantities,
    );

    assert_eq!(merged.len(), 2);
    assert_eq!(
        merged.first(),
        Some(&MergedLine {
            uuid: Some(session_a.uuid),
            product: a,
            quantity: 5,
        }),
        "session line id is kept for the combined line"
    );
    assert_eq!(
        merged.get(1),
        Some(&MergedLine {
            uuid: Some(session_b.uuid),
            product: b,
            quantity: 1,
        }),
        "session-only lines are unchanged"
    );
}

#[test]
fn keep_session_policy_keeps_the_session_quantity() {
    let a = ProductUuid::new();
    let b = ProductUuid::new();

    let merged = reconcile(
        &[line(a, 2)],
        &[line(a, 3), line(b, 1)],
        MergePolicy::KeepSession,
    );

    assert_eq!(quantity_of(&merged, a), Some(3));
    assert_eq!(quantity_of(&merged, b), Some(1));
}

#[test]
fn user_only_products_are_inserted_before_session_only_products() {
    let a = ProductUuid::new();
    let b = ProductUuid::new();

    let merged = reconcile(&[line(a, 2)], &[line(b, 1)], MergePolicy::SumQuantities);

    let plan: Vec<(Option<u32>, bool)> = merged
        .iter()
        .map(|line| (Some(line.quantity), line.uuid.is_some()))
        .collect();

    assert_eq!(plan, [(Some(2), false), (Some(1), true)]);
}

#[test]
fn merging_empty_carts_yields_no_lines() {
    assert!(reconcile(&[], &[], MergePolicy::SumQuantities).is_empty());
    assert!(reconcile(&[], &[], MergePolicy::KeepSession).is_empty());
}
