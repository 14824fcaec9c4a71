//! Feature manager façade.
//!
//! The single entry point used by the CLI, template hooks and application
//! code. It validates input, translates high-level verbs into repository
//! calls and logs every state change. It holds no state of its own besides
//! the injected repository, and it never caches: each call reads storage.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use featuregate_core::{FeatureManager, InMemoryFeatureRepository};
//! use featuregate_domain::FeaturableKey;
//!
//! # async fn example() -> featuregate_domain::Result<()> {
//! let manager = FeatureManager::new(Arc::new(InMemoryFeatureRepository::new()));
//!
//! manager.add("dark-mode", None).await?;
//! let alice = FeaturableKey::new("user", "alice");
//! manager.enable_for("dark-mode", &alice).await?;
//!
//! assert!(!manager.is_enabled("dark-mode").await?);
//! assert!(manager.is_enabled_for("dark-mode", &alice).await?);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use featuregate_domain::{validate_feature_name, Featurable, FeaturableKey, Feature, Result};
use tracing::{debug, info};

use crate::featurable::{FeatureLinks, FeaturableExt};
use crate::feature_ports::FeatureRepository;
use crate::resolution::AssociationChange;

/// Orchestration layer over a [`FeatureRepository`].
#[derive(Clone)]
pub struct FeatureManager {
    repository: Arc<dyn FeatureRepository>,
}

impl FeatureManager {
    pub fn new(repository: Arc<dyn FeatureRepository>) -> Self {
        Self { repository }
    }

    /// Register a feature, disabled unless `state` says otherwise.
    ///
    /// Saving is an upsert, so adding an existing name overwrites its global
    /// state.
    ///
    /// # Errors
    /// `Validation` for a bad name, `Storage` if the write fails.
    pub async fn add(&self, name: &str, state: Option<bool>) -> Result<Feature> {
        validate_feature_name(name)?;
        let feature = Feature::new(name, state.unwrap_or(false));
        self.repository.save(&feature).await?;
        info!(feature = %name, enabled = feature.is_enabled(), "feature added");
        Ok(feature)
    }

    /// Remove a feature together with all of its entity associations.
    ///
    /// # Errors
    /// `NotFound` when the feature does not exist.
    pub async fn remove(&self, name: &str) -> Result<()> {
        validate_feature_name(name)?;
        let feature = self.repository.find_by_name(name).await?;
        self.repository.remove(&feature).await?;
        info!(feature = %name, "feature removed");
        Ok(())
    }

    /// Turn a feature on globally.
    pub async fn enable(&self, name: &str) -> Result<Feature> {
        self.set_global_state(name, true).await
    }

    /// Turn a feature off globally. Existing entity associations survive and
    /// take effect again.
    pub async fn disable(&self, name: &str) -> Result<Feature> {
        self.set_global_state(name, false).await
    }

    /// Global state of a feature.
    ///
    /// # Errors
    /// `NotFound` for unknown names; callers wanting "unknown means off"
    /// must translate that themselves.
    pub async fn is_enabled(&self, name: &str) -> Result<bool> {
        validate_feature_name(name)?;
        let enabled = self.repository.find_by_name(name).await?.is_enabled();
        debug!(feature = %name, enabled, "feature evaluated");
        Ok(enabled)
    }

    /// Force-enable a feature for one entity.
    pub async fn enable_for<F>(&self, name: &str, featurable: &F) -> Result<AssociationChange>
    where
        F: Featurable + ?Sized,
    {
        validate_feature_name(name)?;
        let key = featurable.featurable_key();
        let change = self.repository.enable_for(name, &key).await?;
        log_association_change("enable_for", name, &key, change);
        Ok(change)
    }

    /// Remove a per-entity override.
    pub async fn disable_for<F>(&self, name: &str, featurable: &F) -> Result<AssociationChange>
    where
        F: Featurable + ?Sized,
    {
        validate_feature_name(name)?;
        let key = featurable.featurable_key();
        let change = self.repository.disable_for(name, &key).await?;
        log_association_change("disable_for", name, &key, change);
        Ok(change)
    }

    /// Effective state of a feature for one entity.
    pub async fn is_enabled_for<F>(&self, name: &str, featurable: &F) -> Result<bool>
    where
        F: Featurable + ?Sized,
    {
        validate_feature_name(name)?;
        let key = featurable.featurable_key();
        let enabled = self.repository.is_enabled_for(name, &key).await?;
        debug!(feature = %name, featurable = %key, enabled, "feature evaluated for featurable");
        Ok(enabled)
    }

    /// Association-only check; ignores the global state.
    pub async fn has_feature<F>(&self, name: &str, featurable: &F) -> Result<bool>
    where
        F: Featurable + ?Sized,
    {
        validate_feature_name(name)?;
        let links = self.features(featurable);
        let attached = links.has_feature(name).await?;
        debug!(feature = %name, featurable = %links.featurable(), attached, "association checked");
        Ok(attached)
    }

    /// Lazy association handle for an entity.
    pub fn features<F>(&self, featurable: &F) -> FeatureLinks<'_>
    where
        F: Featurable + ?Sized,
    {
        featurable.features(self.repository.as_ref())
    }

    /// Features explicitly attached to an entity.
    pub async fn features_for<F>(&self, featurable: &F) -> Result<Vec<Feature>>
    where
        F: Featurable + ?Sized,
    {
        let links = self.features(featurable);
        let features = links.list().await?;
        debug!(featurable = %links.featurable(), count = features.len(), "attached features listed");
        Ok(features)
    }

    /// All registered features, ordered by name.
    pub async fn list(&self) -> Result<Vec<Feature>> {
        let features = self.repository.list_all().await?;
        debug!(count = features.len(), "features listed");
        Ok(features)
    }

    async fn set_global_state(&self, name: &str, enabled: bool) -> Result<Feature> {
        validate_feature_name(name)?;
        let mut feature = self.repository.find_by_name(name).await?;
        if enabled {
            feature.enable();
        } else {
            feature.disable();
        }
        self.repository.save(&feature).await?;
        info!(feature = %name, enabled, "feature toggled");
        Ok(feature)
    }
}

// Writes are logged at info, no-op requests at debug.
fn log_association_change(verb: &str, name: &str, key: &FeaturableKey, change: AssociationChange) {
    if change.is_write() {
        info!(feature = %name, featurable = %key, %change, "{verb}");
    } else {
        debug!(feature = %name, featurable = %key, %change, "{verb}");
    }
}
