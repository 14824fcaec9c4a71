//! # FeatureGate Infrastructure
//!
//! Infrastructure implementations of core domain ports.
//!
//! This crate contains:
//! - SQLite persistence for features and featurable associations
//! - Connection pooling and schema migrations
//! - Configuration loading from environment and files
//! - The template scanner used for feature audits
//!
//! ## Architecture
//! - Implements traits defined in `featuregate-core`
//! - Contains all "impure" code (database and filesystem I/O)

pub mod config;
pub mod database;
pub mod errors;
pub mod scanner;

// Re-export commonly used items
pub use database::*;
pub use errors::InfraError;
pub use scanner::{scan_directory, ScanReport, TemplateScanner};
