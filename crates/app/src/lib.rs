//! Rebate application services, collaborators and CLI support.

pub mod config;
pub mod context;
pub mod domain;
pub mod fixtures;
pub mod memory;
pub mod observability;
pub mod store;

#[cfg(test)]
mod test;
