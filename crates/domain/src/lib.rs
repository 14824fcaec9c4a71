//! # FeatureGate Domain
//!
//! Business domain types for the feature flag registry.
//!
//! This crate contains:
//! - The `Feature` value object and its global state
//! - The `Featurable` identity contract for per-entity overrides
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Name validation rules shared by every caller
//!
//! ## Architecture
//! - No dependencies on other FeatureGate crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;
pub mod validation;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use validation::validate_feature_name;
