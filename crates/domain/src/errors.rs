//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for FeatureGate
///
/// `NotFound` is never collapsed into a disabled result by the core; callers
/// that want "unknown means off" must translate at their own boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum FeatureGateError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl FeatureGateError {
    /// Standard `NotFound` error for a missing feature.
    pub fn feature_not_found(name: &str) -> Self {
        Self::NotFound(format!("feature `{name}` does not exist"))
    }

    /// Whether the error reports a missing feature.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Stable label suitable for logging fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage",
            Self::Config(_) => "config",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for FeatureGate operations
pub type Result<T> = std::result::Result<T, FeatureGateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_feature() {
        let err = FeatureGateError::feature_not_found("dark-mode");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: feature `dark-mode` does not exist");
    }

    #[test]
    fn serializes_with_type_tag() {
        let err = FeatureGateError::Validation("empty name".into());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["type"], "Validation");
        assert_eq!(json["message"], "empty name");
    }

    #[test]
    fn labels_are_stable() {
        assert_eq!(FeatureGateError::Storage(String::new()).label(), "storage");
        assert_eq!(FeatureGateError::NotFound(String::new()).label(), "not_found");
    }
}
