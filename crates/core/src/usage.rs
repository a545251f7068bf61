//! Usage Limiter
//!
//! Redemption checks for vouchers and the per-user usage counters they are checked against.

use jiff::Timestamp;

use crate::{
    content::UserUuid,
    errors::VoucherError,
    offers::{OfferKind, OfferRule, OfferUuid},
};

/// What the limiter needs to know about the redemption attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoucherContext {
    /// Cart owner, if known
    pub user: Option<UserUuid>,

    /// Instant the redemption is evaluated at
    pub now: Timestamp,

    /// The user's redemptions of this offer so far
    pub user_usage: u64,

    /// Whether the voucher is already attached to the cart
    pub already_applied: bool,
}

/// Check whether a voucher may be redeemed.
///
/// Checks run in a fixed order and the first failure is returned: offer type, active flag,
/// audience, window start, window end, overall cap, per-user cap, then whether the cart
/// already carries the voucher. A per-user cap cannot be checked without a user.
///
/// # Errors
///
/// Returns the [`VoucherError`] for the first failed check.
pub fn validate_voucher(rule: &OfferRule, context: &VoucherContext) -> Result<(), VoucherError> {
    let offer = &rule.offer;

    if offer.kind != OfferKind::Voucher {
        return Err(VoucherError::NotAVoucher);
    }

    if !offer.is_active {
        return Err(VoucherError::Inactive);
    }

    if !offer.audience.includes(context.user) {
        return Err(VoucherError::UserNotEligible);
    }

    if !offer.window.has_started(context.now) {
        return Err(VoucherError::NotStarted);
    }

    if offer.window.has_ended(context.now) {
        return Err(VoucherError::Expired);
    }

    if offer.limits.overall_reached(offer.usage_count) {
        return Err(VoucherError::OverallLimitReached);
    }

    if offer.limits.per_user.is_some() {
        if context.user.is_none() {
            return Err(VoucherError::UserRequired);
        }

        if offer.limits.per_user_reached(context.user_usage) {
            return Err(VoucherError::UserLimitReached);
        }
    }

    if context.already_applied {
        return Err(VoucherError::AlreadyApplied);
    }

    Ok(())
}

/// Running redemption count for one (offer, user) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OfferUsage {
    /// Offer id
    pub offer: OfferUuid,

    /// User id
    pub user: UserUuid,

    /// Redemptions so far
    pub usage_count: u64,
}

impl OfferUsage {
    /// A pair with no redemptions yet.
    pub fn new(offer: OfferUuid, user: UserUuid) -> Self {
        Self {
            offer,
            user,
            usage_count: 0,
        }
    }

    /// Count a redemption.
    pub fn increment(&mut self) {
        self.usage_count = self.usage_count.saturating_add(1);
    }

    /// Reverse a redemption. The count never drops below zero.
    pub fn decrement(&mut self) {
        self.usage_count = self.usage_count.saturating_sub(1);
    }
}
