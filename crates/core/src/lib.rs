//! Rebate
//!
//! Rebate is an offer eligibility and discount application engine. It decides which
//! promotional rules apply to a cart, works out what each one is worth, and commits the
//! result onto cart lines without over-discounting. It also plans how a returning user's
//! cart merges into their current session cart.

pub mod application;
pub mod benefits;
pub mod conditions;
pub mod content;
pub mod errors;
pub mod merge;
pub mod offers;
pub mod prelude;
pub mod products;
pub mod ranges;
pub mod receipt;
pub mod usage;
pub mod uuids;
