//! Feature repository port.
//!
//! The persistence and query boundary for features and their per-entity
//! associations. Adapters (SQLite in `featuregate-infra`, the in-memory
//! [`crate::memory::InMemoryFeatureRepository`]) implement this trait and
//! delegate every enable/disable/resolve decision to [`crate::resolution`].
//!
//! # Example
//!
//! ```no_run
//! use featuregate_core::FeatureRepository;
//! use featuregate_domain::FeaturableKey;
//!
//! async fn can_see_beta(repo: &impl FeatureRepository, user: &FeaturableKey) -> bool {
//!     repo.is_enabled_for("beta", user).await.unwrap_or(false)
//! }
//! ```

use async_trait::async_trait;
use featuregate_domain::{FeatureGateError, FeaturableKey, Feature, Result};

use crate::resolution::AssociationChange;

/// Port for persisting features and resolving their effective state.
///
/// Every name-keyed method fails with `FeatureGateError::NotFound` when the
/// feature does not exist; none of them report an unknown feature as
/// disabled.
#[async_trait]
pub trait FeatureRepository: Send + Sync {
    /// Upsert by name: update the global state if the feature exists,
    /// otherwise create it.
    async fn save(&self, feature: &Feature) -> Result<()>;

    /// Delete the feature and every association that references it.
    async fn remove(&self, feature: &Feature) -> Result<()>;

    /// Load a disconnected copy of the named feature.
    async fn find_by_name(&self, name: &str) -> Result<Feature>;

    /// Attach the feature to an entity unless the global flag or an existing
    /// association already grants it.
    async fn enable_for(
        &self,
        name: &str,
        featurable: &FeaturableKey,
    ) -> Result<AssociationChange>;

    /// Detach the feature from an entity. Does nothing while the feature is
    /// globally enabled or when no association exists.
    async fn disable_for(
        &self,
        name: &str,
        featurable: &FeaturableKey,
    ) -> Result<AssociationChange>;

    /// Effective state for an entity: global state first, association second.
    async fn is_enabled_for(&self, name: &str, featurable: &FeaturableKey) -> Result<bool>;

    /// Whether an association row exists, ignoring the global state.
    async fn has_association(&self, name: &str, featurable: &FeaturableKey) -> Result<bool>;

    /// All features ordered by name.
    async fn list_all(&self) -> Result<Vec<Feature>>;

    /// Features explicitly attached to an entity, ordered by name.
    async fn features_for(&self, featurable: &FeaturableKey) -> Result<Vec<Feature>>;
}

/// Fail fast on an empty name reaching a repository.
///
/// Callers are expected to validate user input first (see
/// `featuregate_domain::validate_feature_name`); an empty name here is a
/// programming error, not user error.
///
/// # Errors
/// Returns `FeatureGateError::Validation` for an empty name.
pub fn ensure_feature_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(FeatureGateError::Validation(
            "repository called with an empty feature name".into(),
        ));
    }
    Ok(())
}
