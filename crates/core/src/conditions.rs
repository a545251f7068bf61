//! Offer Conditions
//!
//! The trigger test an offer requires before its benefit applies.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::{
    content::CartContent, errors::ConfigurationError, products::ProductUuid, uuids::TypedUuid,
};

/// Marker for condition identifiers.
#[derive(Debug)]
pub struct ConditionMarker;

/// Condition UUID
pub type ConditionUuid = TypedUuid<ConditionMarker>;

/// Condition test and threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionKind {
    /// Summed quantity per eligible product must reach the threshold.
    BasketQuantity(u32),

    /// Eligible basket value must reach the threshold. Not implemented by the engine.
    BasketTotal(u64),

    /// Number of distinct eligible products must reach the threshold. Not implemented by
    /// the engine.
    DistinctItems(u32),
}

impl ConditionKind {
    /// Condition type name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BasketQuantity(_) => "basket_quantity",
            Self::BasketTotal(_) => "basket_total",
            Self::DistinctItems(_) => "distinct_items",
        }
    }
}

/// Offer condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    /// Condition id
    pub uuid: ConditionUuid,

    /// Test and threshold
    pub kind: ConditionKind,
}

/// Result of evaluating a condition against the eligible part of a cart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Qualification {
    /// Indexes of every line whose product is eligible, in cart order.
    pub eligible_lines: SmallVec<[usize; 8]>,

    /// Summed quantity per eligible product.
    pub quantities: FxHashMap<ProductUuid, u64>,

    /// Indexes of eligible lines whose product meets the threshold, in cart order.
    pub qualifying_lines: SmallVec<[usize; 8]>,
}

impl Qualification {
    /// Whether the cart holds no eligible products at all.
    pub fn has_no_eligible_lines(&self) -> bool {
        self.eligible_lines.is_empty()
    }

    /// Whether at least one eligible product meets the threshold.
    pub fn is_met(&self) -> bool {
        !self.qualifying_lines.is_empty()
    }
}

impl Condition {
    /// A condition with a fresh id.
    #[must_use]
    pub fn new(kind: ConditionKind) -> Self {
        Self {
            uuid: ConditionUuid::new(),
            kind,
        }
    }

    /// Evaluate this condition against the lines of `content` whose product is in
    /// `eligible`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::ConditionNotImplemented`] for condition types
    /// without an evaluator.
    pub fn evaluate(
        &self,
        content: &CartContent,
        eligible: &FxHashSet<ProductUuid>,
    ) -> Result<Qualification, ConfigurationError> {
        let threshold = match self.kind {
            ConditionKind::BasketQuantity(threshold) => u64::from(threshold),
            ConditionKind::BasketTotal(_) | ConditionKind::DistinctItems(_) => {
                return Err(ConfigurationError::ConditionNotImplemented(
                    self.kind.as_str(),
                ));
            }
        };

        let mut qualification = Qualification::default();

        for (idx, line) in content.lines().iter().enumerate() {
            if !eligible.contains(&line.product_uuid()) {
                continue;
            }

            qualification.eligible_lines.push(idx);

            let summed = qualification.quantities.entry(line.product_uuid()).or_default();

            *summed = summed.saturating_add(u64::from(line.quantity()));
        }

        qualification.qualifying_lines = qualification
            .eligible_lines
            .iter()
            .copied()
            .filter(|idx| {
                content.line(*idx).is_some_and(|line| {
                    qualification
                        .quantities
                        .get(&line.product_uuid())
                        .is_some_and(|summed| *summed >= threshold)
                })
            })
            .collect();

        Ok(qualification)
    }
}
