//! Offers

pub mod errors;
pub mod repository;
pub mod service;

pub use errors::OffersServiceError;
pub use service::*;
