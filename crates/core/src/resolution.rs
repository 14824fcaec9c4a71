//! Resolution rules for global and per-entity feature state.
//!
//! Global enablement always dominates. An association can only turn a
//! feature on for one entity while the global flag is off; it can never turn
//! it off. Every repository adapter routes its decisions through these
//! functions so the rule lives in one place.

use std::fmt;

/// Why an enable/disable request left storage untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnchangedReason {
    /// The feature is on for everyone; per-entity rows are meaningless.
    GloballyEnabled,
    /// The entity already has the association.
    AlreadyAttached,
    /// The entity has no association to remove.
    NotAttached,
}

/// Outcome of an `enable_for` / `disable_for` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationChange {
    Attach,
    Detach,
    Unchanged(UnchangedReason),
}

impl AssociationChange {
    /// Whether the request requires a storage write.
    pub fn is_write(self) -> bool {
        matches!(self, Self::Attach | Self::Detach)
    }
}

impl fmt::Display for AssociationChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attach => f.write_str("attached"),
            Self::Detach => f.write_str("detached"),
            Self::Unchanged(UnchangedReason::GloballyEnabled) => {
                f.write_str("unchanged (enabled globally)")
            }
            Self::Unchanged(UnchangedReason::AlreadyAttached) => {
                f.write_str("unchanged (already enabled)")
            }
            Self::Unchanged(UnchangedReason::NotAttached) => {
                f.write_str("unchanged (not enabled)")
            }
        }
    }
}

/// Decide what `enable_for` must do.
pub fn plan_enable_for(globally_enabled: bool, attached: bool) -> AssociationChange {
    if globally_enabled {
        AssociationChange::Unchanged(UnchangedReason::GloballyEnabled)
    } else if attached {
        AssociationChange::Unchanged(UnchangedReason::AlreadyAttached)
    } else {
        AssociationChange::Attach
    }
}

/// Decide what `disable_for` must do.
pub fn plan_disable_for(globally_enabled: bool, attached: bool) -> AssociationChange {
    if globally_enabled {
        AssociationChange::Unchanged(UnchangedReason::GloballyEnabled)
    } else if attached {
        AssociationChange::Detach
    } else {
        AssociationChange::Unchanged(UnchangedReason::NotAttached)
    }
}

/// Effective state for an entity.
///
/// `attached` is only consulted when the global flag is off; adapters use
/// [`needs_association_lookup`] to skip the query entirely.
pub fn resolve(globally_enabled: bool, attached: impl FnOnce() -> bool) -> bool {
    globally_enabled || attached()
}

/// Whether resolving the feature requires reading the association table.
pub fn needs_association_lookup(globally_enabled: bool) -> bool {
    !globally_enabled
}
