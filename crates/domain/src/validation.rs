//! Feature name validation
//!
//! Every caller-supplied name passes through [`validate_feature_name`] before
//! it reaches a repository.

use crate::constants::MAX_FEATURE_NAME_LENGTH;
use crate::errors::{FeatureGateError, Result};

/// Validate a feature name.
///
/// Rejects empty or whitespace-only names, names longer than
/// [`MAX_FEATURE_NAME_LENGTH`] characters and names containing control
/// characters.
///
/// # Errors
/// Returns `FeatureGateError::Validation` describing the first violated rule.
pub fn validate_feature_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(FeatureGateError::Validation("feature name must not be empty".into()));
    }

    let length = name.chars().count();
    if length > MAX_FEATURE_NAME_LENGTH {
        return Err(FeatureGateError::Validation(format!(
            "feature name is {length} characters long (max {MAX_FEATURE_NAME_LENGTH})"
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(FeatureGateError::Validation(
            "feature name must not contain control characters".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        for name in ["dark-mode", "new_checkout", "beta.search", "Ünïcode"] {
            assert!(validate_feature_name(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(matches!(validate_feature_name(""), Err(FeatureGateError::Validation(_))));
        assert!(matches!(validate_feature_name("   "), Err(FeatureGateError::Validation(_))));
    }

    #[test]
    fn rejects_control_characters() {
        assert!(validate_feature_name("dark\nmode").is_err());
        assert!(validate_feature_name("dark\tmode").is_err());
    }

    #[test]
    fn enforces_length_limit() {
        let at_limit = "a".repeat(MAX_FEATURE_NAME_LENGTH);
        let over_limit = "a".repeat(MAX_FEATURE_NAME_LENGTH + 1);
        assert!(validate_feature_name(&at_limit).is_ok());
        assert!(validate_feature_name(&over_limit).is_err());
    }
}
