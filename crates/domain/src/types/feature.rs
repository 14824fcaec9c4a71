//! Feature value object
//!
//! A `Feature` is a disconnected copy of persisted state: mutating one does
//! nothing until it is handed back to a repository's `save`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::FeatureGateError;

/// Global state of a feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureState {
    Enabled,
    #[default]
    Disabled,
}

impl FeatureState {
    /// Parse the loose textual forms accepted on command lines and in
    /// configuration (`1`/`0`, `true`/`false`, `on`/`off`, `yes`/`no`,
    /// `enabled`/`disabled`, case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "on" | "yes" | "enabled" => Some(Self::Enabled),
            "0" | "false" | "off" | "no" | "disabled" => Some(Self::Disabled),
            _ => None,
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

impl From<bool> for FeatureState {
    fn from(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

impl fmt::Display for FeatureState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Enabled => f.write_str("enabled"),
            Self::Disabled => f.write_str("disabled"),
        }
    }
}

impl FromStr for FeatureState {
    type Err = FeatureGateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
            .ok_or_else(|| FeatureGateError::Validation(format!("invalid feature state: {s}")))
    }
}

/// A named flag and its global enabled state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    name: String,
    is_enabled: bool,
}

impl Feature {
    /// Create a feature with an explicit global state.
    pub fn new(name: impl Into<String>, enabled: bool) -> Self {
        Self { name: name.into(), is_enabled: enabled }
    }

    /// Create a globally disabled feature.
    pub fn disabled(name: impl Into<String>) -> Self {
        Self::new(name, false)
    }

    /// Create a feature from an optional textual state.
    ///
    /// Missing or unparseable states yield a disabled feature.
    pub fn with_state(name: impl Into<String>, state: Option<&str>) -> Self {
        let enabled = state.and_then(FeatureState::parse).is_some_and(FeatureState::is_enabled);
        Self::new(name, enabled)
    }

    /// Rebuild a feature from stored primitives. Performs no validation.
    pub fn from_name_and_status(name: impl Into<String>, status: bool) -> Self {
        Self::new(name, status)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_enabled(&self) -> bool {
        self.is_enabled
    }

    pub fn state(&self) -> FeatureState {
        FeatureState::from(self.is_enabled)
    }

    pub fn enable(&mut self) {
        self.is_enabled = true;
    }

    pub fn disable(&mut self) {
        self.is_enabled = false;
    }
}
