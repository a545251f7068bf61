//! Offer Benefits
//!
//! The monetary effect of an offer and the calculator that commits it onto cart lines.

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{
    content::{CartContent, DiscountEntry, DiscountLedger},
    errors::ConfigurationError,
    offers::OfferUuid,
    uuids::TypedUuid,
};

/// Marker for benefit identifiers.
#[derive(Debug)]
pub struct BenefitMarker;

/// Benefit UUID
pub type BenefitUuid = TypedUuid<BenefitMarker>;

/// What a benefit grants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BenefitKind {
    /// A fixed amount off each discounted unit, in minor units.
    FixedAmount(u64),

    /// A percentage off each discounted unit's selling price.
    Percentage(Percentage),

    /// Free delivery. Not implemented by the engine.
    FreeShipping,

    /// Units sell for a fixed price. Not implemented by the engine.
    FixedPrice(u64),
}

impl BenefitKind {
    /// Benefit type name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::FixedAmount(_) => "fixed_amount",
            Self::Percentage(_) => "percentage",
            Self::FreeShipping => "free_shipping",
            Self::FixedPrice(_) => "fixed_price",
        }
    }

    /// Discount this benefit grants on `units` units selling at `unit_price` each, before
    /// clamping.
    fn discount_for(&self, unit_price: u64, units: u64) -> Result<u64, ConfigurationError> {
        match self {
            Self::FixedAmount(amount) => amount
                .checked_mul(units)
                .ok_or(ConfigurationError::DiscountOverflow),
            Self::Percentage(percent) => {
                let value = unit_price
                    .checked_mul(units)
                    .ok_or(ConfigurationError::DiscountOverflow)?;

                percent_of_minor(percent, value)
            }
            Self::FreeShipping | Self::FixedPrice(_) => {
                Err(ConfigurationError::BenefitNotImplemented(self.as_str()))
            }
        }
    }
}

/// Offer benefit
#[derive(Debug, Clone, PartialEq)]
pub struct Benefit {
    /// Benefit id
    pub uuid: BenefitUuid,

    /// What the benefit grants
    pub kind: BenefitKind,

    /// Maximum number of units discounted per line, when set.
    pub max_affected_items: Option<u32>,

    /// Inactive benefits are skipped without error.
    pub is_active: bool,
}

/// Who is recording a discount, copied onto every ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountSource {
    /// Offer id
    pub offer: OfferUuid,

    /// Offer name
    pub name: String,

    /// Ledger the entries go to
    pub ledger: DiscountLedger,

    /// Code the voucher was redeemed with
    pub voucher_code: Option<String>,
}

impl Benefit {
    /// An active, uncapped benefit.
    #[must_use]
    pub fn new(kind: BenefitKind) -> Self {
        Self {
            uuid: BenefitUuid::new(),
            kind,
            max_affected_items: None,
            is_active: true,
        }
    }

    /// Cap the number of units discounted per line.
    #[must_use]
    pub fn with_max_affected_items(mut self, max: u32) -> Self {
        self.max_affected_items = Some(max);
        self
    }

    /// Compute this benefit's discount for one line and record it on the content.
    ///
    /// With `max_affected_items` set, units are discounted one at a time until the cap is
    /// reached or the line has no value left. Without it, the whole line is discounted in
    /// one step. Either way the recorded amount never exceeds the line's remaining value,
    /// so stacked offers cannot push a line below zero. Zero amounts are not recorded.
    ///
    /// Returns the amount recorded.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::BenefitNotImplemented`] for benefit types without a
    /// calculator and [`ConfigurationError::DiscountOverflow`] if the amount cannot be
    /// represented.
    pub fn apply_to_line(
        &self,
        content: &mut CartContent,
        idx: usize,
        source: &DiscountSource,
    ) -> Result<u64, ConfigurationError> {
        let Some(line) = content.line(idx) else {
            return Ok(0);
        };

        let unit_price = line.unit_selling_price();
        let quantity = u64::from(line.quantity());
        let mut remaining = line.remaining_value();

        let amount = match self.max_affected_items {
            Some(max) => {
                let mut amount = 0_u64;

                for _ in 0..quantity.min(u64::from(max)) {
                    if remaining == 0 {
                        break;
                    }

                    let unit_discount = self
                        .kind
                        .discount_for(unit_price, 1)?
                        .min(unit_price)
                        .min(remaining);

                    amount = amount.saturating_add(unit_discount);
                    remaining -= unit_discount;
                }

                amount
            }
            None => self.kind.discount_for(unit_price, quantity)?.min(remaining),
        };

        if amount > 0 {
            content.record_discount(
                idx,
                source.ledger,
                DiscountEntry {
                    offer: source.offer,
                    name: source.name.clone(),
                    benefit: self.kind,
                    amount,
                    voucher_code: source.voucher_code.clone(),
                },
            );
        }

        Ok(amount)
    }
}

/// Calculate the discount amount in minor units for a percentage of a minor unit amount.
///
/// Rounds half away from zero to whole minor units.
///
/// # Errors
///
/// Returns [`ConfigurationError::DiscountOverflow`] if the calculation overflows or is
/// negative.
pub fn percent_of_minor(percent: &Percentage, minor: u64) -> Result<u64, ConfigurationError> {
    let minor = Decimal::from_u64(minor).ok_or(ConfigurationError::DiscountOverflow)?;

    ((*percent) * Decimal::ONE) // decimal_percentage does not expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(ConfigurationError::DiscountOverflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_u64()
        .ok_or(ConfigurationError::DiscountOverflow)
}
