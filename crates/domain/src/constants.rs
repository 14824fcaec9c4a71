//! Domain constants
//!
//! Centralized location for limits and defaults shared across crates.

/// Longest feature name accepted by validation (matches the `features.name`
/// column contract).
pub const MAX_FEATURE_NAME_LENGTH: usize = 255;

/// Separator between entity kind and entity id in textual featurable keys
/// (e.g. `user:42`).
pub const FEATURABLE_KEY_SEPARATOR: char = ':';

// Configuration defaults
pub const DEFAULT_DB_PATH: &str = "featuregate.db";
pub const DEFAULT_DB_POOL_SIZE: u32 = 4;
pub const DEFAULT_LOG_LEVEL: &str = "warn";
