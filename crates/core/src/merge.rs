//! Cart Merge
//!
//! Plans how a returning user's dormant cart folds into the cart of the session they just
//! signed in from.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{content::CartLineUuid, products::ProductUuid};

/// A stored cart line, as read for merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    /// Line id
    pub uuid: CartLineUuid,

    /// Product id
    pub product: ProductUuid,

    /// Unit count
    pub quantity: u32,
}

/// How quantities combine when both carts hold the same product.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MergePolicy {
    /// Add the user cart's quantity to the session cart's.
    #[default]
    SumQuantities,

    /// Keep the session cart's quantity.
    KeepSession,
}

impl MergePolicy {
    /// Policy from the "sum quantities" flag.
    pub const fn from_sum_flag(sum: bool) -> Self {
        if sum {
            Self::SumQuantities
        } else {
            Self::KeepSession
        }
    }

    fn combine(self, session: u32, user: u32) -> u32 {
        match self {
            Self::SumQuantities => session.saturating_add(user),
            Self::KeepSession => session,
        }
    }
}

/// A line the session cart ends up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergedLine {
    /// Existing session line to update, or `None` for a line to insert.
    pub uuid: Option<CartLineUuid>,

    /// Product id
    pub product: ProductUuid,

    /// Resulting unit count
    pub quantity: u32,
}

/// Reconcile the user cart's lines into the session cart's lines.
///
/// Each user line whose product the session cart also holds updates that session line,
/// combining quantities per `policy`. A user line for a product the session cart lacks
/// becomes a new line. Session lines not touched by the user cart are kept unchanged.
///
/// User-derived lines come first, in user cart order, followed by the untouched session
/// lines in session cart order. Several user lines for one product fold into one result.
pub fn reconcile(
    user_lines: &[CartLine],
    session_lines: &[CartLine],
    policy: MergePolicy,
) -> Vec<MergedLine> {
    let mut session_by_product: FxHashMap<ProductUuid, &CartLine> = FxHashMap::default();

    for line in session_lines {
        session_by_product.entry(line.product).or_insert(line);
    }

    let mut merged: Vec<MergedLine> = Vec::with_capacity(user_lines.len() + session_lines.len());
    let mut positions: FxHashMap<ProductUuid, usize> = FxHashMap::default();
    let mut consumed: FxHashSet<CartLineUuid> = FxHashSet::default();

    for user_line in user_lines {
        if let Some(existing) = positions
            .get(&user_line.product)
            .and_then(|idx| merged.get_mut(*idx))
        {
            if existing.uuid.is_none() || policy == MergePolicy::SumQuantities {
                existing.quantity = existing.quantity.saturating_add(user_line.quantity);
            }

            continue;
        }

        let line = match session_by_product.get(&user_line.product) {
            Some(session_line) => {
                consumed.insert(session_line.uuid);

                MergedLine {
                    uuid: Some(session_line.uuid),
                    product: session_line.product,
                    quantity: policy.combine(session_line.quantity, user_line.quantity),
                }
            }
            None => MergedLine {
                uuid: None,
                product: user_line.product,
                quantity: user_line.quantity,
            },
        };

        positions.insert(user_line.product, merged.len());
        merged.push(line);
    }

    merged.extend(
        session_lines
            .iter()
            .filter(|line| !consumed.contains(&line.uuid))
            .map(|line| MergedLine {
                uuid: Some(line.uuid),
                product: line.product,
                quantity: line.quantity,
            }),
    );

    merged
}
