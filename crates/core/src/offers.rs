//! Offers
//!
//! An offer names a rule, scopes it to an audience and a validity window, and limits how
//! often it may be redeemed. [`OfferRule`] is the resolved value the engine evaluates: the
//! offer together with its range, condition and benefit.

use jiff::Timestamp;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    benefits::Benefit, conditions::Condition, content::UserUuid, ranges::Range,
    uuids::TypedUuid,
};

/// Marker for offer identifiers.
#[derive(Debug)]
pub struct OfferMarker;

/// Offer UUID
pub type OfferUuid = TypedUuid<OfferMarker>;

/// How an offer reaches a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferKind {
    /// Site-wide promotion. Not applied automatically by the engine.
    Site,

    /// Redeemed by entering a code.
    Voucher,

    /// Targeted at users and applied automatically to their carts.
    User,
}

impl OfferKind {
    /// Offer type name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Site => "site",
            Self::Voucher => "voucher",
            Self::User => "user",
        }
    }
}

/// Users an offer is available to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Audience {
    /// Every user, and anonymous carts.
    #[default]
    Everyone,

    /// Only the listed users.
    Users(FxHashSet<UserUuid>),
}

impl Audience {
    /// Whether the offer is available to `user`. Restricted audiences exclude anonymous
    /// carts.
    pub fn includes(&self, user: Option<UserUuid>) -> bool {
        match self {
            Self::Everyone => true,
            Self::Users(users) => user.is_some_and(|user| users.contains(&user)),
        }
    }
}

/// Inclusive validity window. Missing bounds are open-ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidityWindow {
    /// First valid instant
    pub starts_at: Option<Timestamp>,

    /// Last valid instant
    pub ends_at: Option<Timestamp>,
}

impl ValidityWindow {
    /// Whether the window has opened by `now`.
    pub fn has_started(&self, now: Timestamp) -> bool {
        self.starts_at.is_none_or(|starts_at| starts_at <= now)
    }

    /// Whether the window closed before `now`.
    pub fn has_ended(&self, now: Timestamp) -> bool {
        self.ends_at.is_some_and(|ends_at| ends_at < now)
    }

    /// Whether `now` falls inside the window.
    pub fn contains(&self, now: Timestamp) -> bool {
        self.has_started(now) && !self.has_ended(now)
    }
}

/// Redemption caps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageLimits {
    /// Redemptions allowed to each user
    pub per_user: Option<u64>,

    /// Redemptions allowed across all users
    pub overall: Option<u64>,
}

impl UsageLimits {
    /// Whether the overall cap is exhausted at the given global usage count.
    pub fn overall_reached(&self, usage_count: u64) -> bool {
        self.overall.is_some_and(|limit| usage_count >= limit)
    }

    /// Whether the per-user cap is exhausted at the given user usage count.
    pub fn per_user_reached(&self, user_usage: u64) -> bool {
        self.per_user.is_some_and(|limit| user_usage >= limit)
    }
}

/// Offer header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offer {
    /// Offer id
    pub uuid: OfferUuid,

    /// Display name, copied onto ledger entries
    pub name: String,

    /// Offer type
    pub kind: OfferKind,

    /// Redemption code, for vouchers
    pub voucher_code: Option<String>,

    /// Eligible users
    pub audience: Audience,

    /// Validity window
    pub window: ValidityWindow,

    /// Switched on
    pub is_active: bool,

    /// Higher priorities apply first.
    pub priority: i32,

    /// Redemption caps
    pub limits: UsageLimits,

    /// Redemptions so far, across all users
    pub usage_count: u64,

    /// Creation instant, used to order offers of equal priority.
    pub created_at: Timestamp,
}

impl Offer {
    /// An active, unrestricted offer of the given kind.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: OfferKind, created_at: Timestamp) -> Self {
        Self {
            uuid: OfferUuid::new(),
            name: name.into(),
            kind,
            voucher_code: None,
            audience: Audience::Everyone,
            window: ValidityWindow::default(),
            is_active: true,
            priority: 0,
            limits: UsageLimits::default(),
            usage_count: 0,
            created_at,
        }
    }

    /// A voucher offer redeemed with `code`.
    #[must_use]
    pub fn voucher(name: impl Into<String>, code: impl Into<String>, created_at: Timestamp) -> Self {
        Self {
            voucher_code: Some(code.into()),
            ..Self::new(name, OfferKind::Voucher, created_at)
        }
    }
}

/// An offer resolved together with the range, condition and benefit it applies.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferRule {
    /// Offer header
    pub offer: Offer,

    /// Products covered
    pub range: Range,

    /// Trigger test
    pub condition: Condition,

    /// Monetary effect
    pub benefit: Benefit,
}

impl OfferRule {
    /// Offer id
    pub fn uuid(&self) -> OfferUuid {
        self.offer.uuid
    }
}

/// Select the standing offers available to `user` at `now`, in application order.
///
/// Only active user-targeted offers are considered. An offer is dropped when the user is
/// outside its audience, `now` is outside its window, its overall cap is exhausted, or the
/// user's own redemptions (`user_usage`, keyed by offer) have reached the per-user cap.
/// The rest are ordered by priority, highest first, then by creation time, newest first.
pub fn standing_offers<'r>(
    rules: impl IntoIterator<Item = &'r OfferRule>,
    user: UserUuid,
    now: Timestamp,
    user_usage: &FxHashMap<OfferUuid, u64>,
) -> Vec<&'r OfferRule> {
    let mut selected: Vec<&OfferRule> = rules
        .into_iter()
        .filter(|rule| {
            let offer = &rule.offer;
            let used = user_usage.get(&offer.uuid).copied().unwrap_or_default();

            offer.kind == OfferKind::User
                && offer.is_active
                && offer.audience.includes(Some(user))
                && offer.window.contains(now)
                && !offer.limits.overall_reached(offer.usage_count)
                && !offer.limits.per_user_reached(used)
        })
        .collect();

    selected.sort_by(|a, b| {
        b.offer
            .priority
            .cmp(&a.offer.priority)
            .then_with(|| b.offer.created_at.cmp(&a.offer.created_at))
    });

    selected
}

#[cfg(test)]
mod tests {
    use jiff::{SignedDuration, ToSpan};
    use testresult::TestResult;

    use crate::{
        benefits::BenefitKind,
        conditions::ConditionKind,
        ranges::{Dimension, FilterMode},
    };

    use super::*;

    fn rule(offer: Offer) -> OfferRule {
        OfferRule {
            offer,
            range: Range::new(FilterMode::Union).with_products(Dimension::all()),
            condition: Condition::new(ConditionKind::BasketQuantity(1)),
            benefit: Benefit::new(BenefitKind::FixedAmount(100)),
        }
    }

    #[test]
    fn window_bounds_are_inclusive() -> TestResult {
        let now = Timestamp::now();
        let window = ValidityWindow {
            starts_at: Some(now),
            ends_at: Some(now),
        };

        assert!(window.contains(now));
        assert!(!window.contains(now.checked_sub(1.second())?));
        assert!(!window.contains(now.checked_add(1.second())?));
        assert!(ValidityWindow::default().contains(now));

        Ok(())
    }

    #[test]
    fn restricted_audience_excludes_anonymous_carts() {
        let user = UserUuid::new();
        let audience = Audience::Users(FxHashSet::from_iter([user]));

        assert!(audience.includes(Some(user)));
        assert!(!audience.includes(Some(UserUuid::new())));
        assert!(!audience.includes(None));
        assert!(Audience::Everyone.includes(None));
    }

    #[test]
    fn standing_offers_are_ordered_by_priority_then_recency() -> TestResult {
        let now = Timestamp::now();
        let earlier = now.checked_sub(SignedDuration::from_hours(1))?;

        let low = rule(Offer::new("Low", OfferKind::User, now));
        let old_high = rule(Offer {
            priority: 10,
            ..Offer::new("Old high", OfferKind::User, earlier)
        });
        let new_high = rule(Offer {
            priority: 10,
            ..Offer::new("New high", OfferKind::User, now)
        });

        let rules = [low, old_high, new_high];
        let names: Vec<&str> = standing_offers(&rules, UserUuid::new(), now, &FxHashMap::default())
            .into_iter()
            .map(|rule| rule.offer.name.as_str())
            .collect();

        assert_eq!(names, ["New high", "Old high", "Low"]);

        Ok(())
    }

    #[test]
    fn standing_offers_drop_unavailable_offers() -> TestResult {
        let now = Timestamp::now();
        let user = UserUuid::new();

        let per_user_capped = rule(Offer {
            limits: UsageLimits {
                per_user: Some(1),
                overall: None,
            },
            ..Offer::new("Per user", OfferKind::User, now)
        });

        let rules = [
            rule(Offer::new("Available", OfferKind::User, now)),
            rule(Offer::new("Site", OfferKind::Site, now)),
            rule(Offer::voucher("Voucher", "CODE", now)),
            rule(Offer {
                is_active: false,
                ..Offer::new("Inactive", OfferKind::User, now)
            }),
            rule(Offer {
                audience: Audience::Users(FxHashSet::from_iter([UserUuid::new()])),
                ..Offer::new("Someone else", OfferKind::User, now)
            }),
            rule(Offer {
                window: ValidityWindow {
                    starts_at: None,
                    ends_at: Some(now.checked_sub(1.second())?),
                },
                ..Offer::new("Expired", OfferKind::User, now)
            }),
            rule(Offer {
                limits: UsageLimits {
                    per_user: None,
                    overall: Some(3),
                },
                usage_count: 3,
                ..Offer::new("Exhausted", OfferKind::User, now)
            }),
            per_user_capped.clone(),
        ];

        let usage = FxHashMap::from_iter([(per_user_capped.uuid(), 1)]);

        let names: Vec<&str> = standing_offers(&rules, user, now, &usage)
            .into_iter()
            .map(|rule| rule.offer.name.as_str())
            .collect();

        assert_eq!(names, ["Available"]);

        Ok(())
    }
}
