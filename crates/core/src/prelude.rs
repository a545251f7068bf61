//! Rebate prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    application::{OfferOutcome, SkipReason, apply_standing_offer, apply_voucher},
    benefits::{Benefit, BenefitKind, BenefitUuid, DiscountSource, percent_of_minor},
    conditions::{Condition, ConditionKind, ConditionUuid, Qualification},
    content::{
        CartContent, CartHeader, CartLineUuid, CartStatus, CartUuid, ContentError, ContentLine,
        DiscountEntry, DiscountLedger, SessionUuid, UserUuid,
    },
    errors::{ApplicationError, ConfigurationError, VoucherError},
    merge::{CartLine, MergePolicy, MergedLine, reconcile},
    offers::{
        Audience, Offer, OfferKind, OfferRule, OfferUuid, UsageLimits, ValidityWindow,
        standing_offers,
    },
    products::{
        BrandUuid, CategoryUuid, Product, ProductAttributes, ProductClassUuid, ProductPrices,
        ProductUuid,
    },
    ranges::{Dimension, FilterMode, Range, RangeUuid},
    receipt::{ReceiptError, write_receipt},
    usage::{OfferUsage, VoucherContext, validate_voucher},
    uuids::TypedUuid,
};
