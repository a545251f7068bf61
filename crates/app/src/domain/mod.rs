//! Rebate Domain Concerns

pub mod carts;
pub mod offers;
pub mod pricing;
pub mod products;
