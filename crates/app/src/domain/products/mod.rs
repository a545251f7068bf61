//! Products

pub mod repository;

pub use repository::*;
