//! Database implementations

pub mod feature_repository;
pub mod manager;

pub use feature_repository::*;
pub use manager::*;
