//! # FeatureGate Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The `FeatureRepository` port (trait)
//! - Resolution rules for global vs per-entity state
//! - The `FeatureManager` façade used by every caller
//! - Featurable association handles
//! - Template conditionals evaluated through the manager
//! - An in-memory repository for tests and embedding
//!
//! ## Architecture Principles
//! - Only depends on `featuregate-domain`
//! - No database, HTTP, or filesystem code
//! - All storage access via the `FeatureRepository` trait

pub mod featurable;
pub mod feature_ports;
pub mod manager;
pub mod memory;
pub mod resolution;
pub mod template;

// Re-export specific items to avoid ambiguity
pub use featurable::{FeaturableExt, FeatureLinks};
pub use feature_ports::{ensure_feature_name, FeatureRepository};
pub use manager::FeatureManager;
pub use memory::InMemoryFeatureRepository;
pub use resolution::{AssociationChange, UnchangedReason};
pub use template::{RenderContext, Template};
