//! Featurable identity contract
//!
//! An entity takes part in per-entity overrides by exposing a stable
//! identity: a type discriminant plus its own primary key. The association
//! rows in storage are keyed by exactly this pair.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::FEATURABLE_KEY_SEPARATOR;
use crate::errors::{FeatureGateError, Result};

/// Identity of a featurable entity, e.g. `user:42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeaturableKey {
    kind: String,
    id: String,
}

impl FeaturableKey {
    /// Build a key from trusted parts.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self { kind: kind.into(), id: id.into() }
    }

    /// Build a key, rejecting empty parts and a separator inside `kind`.
    ///
    /// # Errors
    /// Returns `FeatureGateError::Validation` when either part is unusable.
    pub fn try_new(kind: impl Into<String>, id: impl Into<String>) -> Result<Self> {
        let key = Self::new(kind, id);
        if key.kind.trim().is_empty() || key.id.trim().is_empty() {
            return Err(FeatureGateError::Validation(
                "featurable type and id must not be empty".into(),
            ));
        }
        if key.kind.contains(FEATURABLE_KEY_SEPARATOR) {
            return Err(FeatureGateError::Validation(format!(
                "featurable type `{}` must not contain `{FEATURABLE_KEY_SEPARATOR}`",
                key.kind
            )));
        }
        Ok(key)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for FeaturableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{FEATURABLE_KEY_SEPARATOR}{}", self.kind, self.id)
    }
}

impl FromStr for FeaturableKey {
    type Err = FeatureGateError;

    /// Parse `kind:id`. Only the first separator splits, so ids may contain
    /// colons.
    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s.split_once(FEATURABLE_KEY_SEPARATOR).ok_or_else(|| {
            FeatureGateError::Validation(format!(
                "featurable `{s}` must look like `type{FEATURABLE_KEY_SEPARATOR}id`"
            ))
        })?;
        Self::try_new(kind, id)
    }
}

/// Capability implemented by entities that can receive per-entity overrides.
///
/// Implementors only describe who they are; association queries go through
/// a repository (see `featuregate_core::featurable`).
pub trait Featurable {
    /// Entity type discriminant stored alongside the id (e.g. `"user"`).
    fn featurable_type(&self) -> &str;

    /// Stable primary key of the entity within its own type.
    fn featurable_id(&self) -> String;

    fn featurable_key(&self) -> FeaturableKey {
        FeaturableKey::new(self.featurable_type(), self.featurable_id())
    }
}

impl Featurable for FeaturableKey {
    fn featurable_type(&self) -> &str {
        &self.kind
    }

    fn featurable_id(&self) -> String {
        self.id.clone()
    }

    fn featurable_key(&self) -> FeaturableKey {
        self.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Team {
        id: u64,
    }

    impl Featurable for Team {
        fn featurable_type(&self) -> &str {
            "team"
        }

        fn featurable_id(&self) -> String {
            self.id.to_string()
        }
    }

    #[test]
    fn default_key_combines_type_and_id() {
        let key = Team { id: 7 }.featurable_key();
        assert_eq!(key, FeaturableKey::new("team", "7"));
        assert_eq!(key.to_string(), "team:7");
    }

    #[test]
    fn parses_first_separator_only() {
        let key: FeaturableKey = "tenant:eu:42".parse().unwrap();
        assert_eq!(key.kind(), "tenant");
        assert_eq!(key.id(), "eu:42");
    }

    #[test]
    fn rejects_malformed_keys() {
        for raw in ["user", ":42", "user:", " : "] {
            assert!(raw.parse::<FeaturableKey>().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn try_new_rejects_separator_in_kind() {
        assert!(FeaturableKey::try_new("a:b", "1").is_err());
    }
}
