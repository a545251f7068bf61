//! Engine Errors

use thiserror::Error;

/// A misconfigured offer. These must reach an administrator rather than be skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The condition type has no evaluator.
    #[error("condition type `{0}` is not implemented")]
    ConditionNotImplemented(&'static str),

    /// The benefit type has no calculator.
    #[error("benefit type `{0}` is not implemented")]
    BenefitNotImplemented(&'static str),

    /// The benefit value cannot be represented in minor units.
    #[error("discount calculation overflowed or was not finite")]
    DiscountOverflow,
}

/// Reasons a voucher cannot be redeemed against a cart.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VoucherError {
    /// The offer exists but is not a voucher.
    #[error("offer is not a voucher")]
    NotAVoucher,

    /// The voucher has been switched off.
    #[error("voucher is not active")]
    Inactive,

    /// The user is not on the voucher's allow-list.
    #[error("voucher is not available to this user")]
    UserNotEligible,

    /// The validity window has not opened yet.
    #[error("voucher is not valid yet")]
    NotStarted,

    /// The validity window has closed.
    #[error("voucher has expired")]
    Expired,

    /// Every redemption allowed overall has been used.
    #[error("voucher usage limit exceeded")]
    OverallLimitReached,

    /// The user has used every redemption allowed to them.
    #[error("voucher usage limit exceeded for this user")]
    UserLimitReached,

    /// A per-user limit is configured but the cart has no user.
    #[error("a user is required to redeem this voucher")]
    UserRequired,

    /// The voucher is already attached to this cart.
    #[error("voucher already applied to this cart")]
    AlreadyApplied,

    /// The voucher's benefit has been switched off.
    #[error("voucher benefit is not active")]
    BenefitInactive,

    /// Every eligible line is already discounted to zero.
    #[error("discount already applied to all applicable products")]
    AlreadyFullyDiscounted,

    /// Nothing in the cart satisfies the voucher.
    #[error("voucher is not applicable to any product in the cart")]
    NotApplicable,
}

/// Errors raised while applying an offer to cart content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    /// The offer is misconfigured.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The voucher failed validation or does not apply.
    #[error(transparent)]
    Voucher(#[from] VoucherError),
}
