//! Offer Application
//!
//! Runs one resolved offer against cart content: resolve eligibility, evaluate the
//! condition, then commit the benefit onto each qualifying line. Standing offers and
//! vouchers share the pipeline but differ in how a non-applicable offer is reported.

use crate::{
    benefits::DiscountSource,
    conditions::Qualification,
    content::{CartContent, ContentLine, DiscountLedger},
    errors::{ApplicationError, ConfigurationError, VoucherError},
    offers::OfferRule,
};

/// Why an offer was left off the cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The benefit is switched off.
    BenefitInactive,

    /// No line holds a product in the offer's range.
    NoEligibleLines,

    /// Every eligible line is already discounted to zero.
    AlreadyFullyDiscounted,

    /// No eligible product meets the condition's threshold.
    ConditionNotMet,

    /// The benefit produced no discount on any qualifying line.
    NothingDiscounted,
}

impl From<SkipReason> for VoucherError {
    fn from(reason: SkipReason) -> Self {
        match reason {
            SkipReason::BenefitInactive => Self::BenefitInactive,
            SkipReason::AlreadyFullyDiscounted => Self::AlreadyFullyDiscounted,
            SkipReason::NoEligibleLines
            | SkipReason::ConditionNotMet
            | SkipReason::NothingDiscounted => Self::NotApplicable,
        }
    }
}

/// Result of running a standing offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    /// Discounts were recorded.
    Applied {
        /// Total recorded across lines, in minor units
        amount: u64,
    },

    /// The offer was left off the cart.
    Skipped(SkipReason),
}

/// Apply a standing offer to `content`.
///
/// An offer that does not apply is skipped rather than failed, so one offer never blocks
/// the rest of the build.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if the offer's condition or benefit type is not
/// implemented or its discount cannot be represented.
pub fn apply_standing_offer(
    content: &mut CartContent,
    rule: &OfferRule,
) -> Result<OfferOutcome, ConfigurationError> {
    let source = DiscountSource {
        offer: rule.offer.uuid,
        name: rule.offer.name.clone(),
        ledger: DiscountLedger::Standing,
        voucher_code: None,
    };

    match run(content, rule, &source)? {
        Ok(amount) => Ok(OfferOutcome::Applied { amount }),
        Err(reason) => Ok(OfferOutcome::Skipped(reason)),
    }
}

/// Apply an already validated voucher to `content`, returning the amount discounted.
///
/// # Errors
///
/// Returns [`ApplicationError::Voucher`] when the benefit is inactive, the voucher adds
/// nothing because every eligible line is already fully discounted, or no line is
/// discounted at all. Returns [`ApplicationError::Configuration`] for misconfigured
/// offers.
pub fn apply_voucher(content: &mut CartContent, rule: &OfferRule) -> Result<u64, ApplicationError> {
    let source = DiscountSource {
        offer: rule.offer.uuid,
        name: rule.offer.name.clone(),
        ledger: DiscountLedger::Voucher,
        voucher_code: rule.offer.voucher_code.clone(),
    };

    let amount = run(content, rule, &source)?.map_err(VoucherError::from)?;

    Ok(amount)
}

/// Shared pipeline. The outer error is a configuration failure; the inner one says why
/// the offer did not apply.
fn run(
    content: &mut CartContent,
    rule: &OfferRule,
    source: &DiscountSource,
) -> Result<Result<u64, SkipReason>, ConfigurationError> {
    if !rule.benefit.is_active {
        return Ok(Err(SkipReason::BenefitInactive));
    }

    let eligible = rule
        .range
        .covered_products(content.lines().iter().map(ContentLine::product));

    let qualification = rule.condition.evaluate(content, &eligible)?;

    if let Some(reason) = precheck(content, &qualification) {
        return Ok(Err(reason));
    }

    let mut amount = 0_u64;

    for idx in &qualification.qualifying_lines {
        let recorded = rule.benefit.apply_to_line(content, *idx, source)?;

        amount = amount.saturating_add(recorded);
    }

    if amount == 0 {
        return Ok(Err(SkipReason::NothingDiscounted));
    }

    Ok(Ok(amount))
}

fn precheck(content: &CartContent, qualification: &Qualification) -> Option<SkipReason> {
    if qualification.has_no_eligible_lines() {
        return Some(SkipReason::NoEligibleLines);
    }

    let all_fully_discounted = qualification
        .eligible_lines
        .iter()
        .filter_map(|idx| content.line(*idx))
        .all(ContentLine::is_fully_discounted);

    if all_fully_discounted {
        return Some(SkipReason::AlreadyFullyDiscounted);
    }

    if !qualification.is_met() {
        return Some(SkipReason::ConditionNotMet);
    }

    None
}
