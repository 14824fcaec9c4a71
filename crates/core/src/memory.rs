//! In-memory feature repository.
//!
//! Holds everything behind one async mutex, so every operation is serialized
//! the same way the SQLite adapter serializes writers with `BEGIN IMMEDIATE`.
//! Useful for tests and for embedding without a database.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use featuregate_domain::{FeatureGateError, FeaturableKey, Feature, Result};
use tokio::sync::Mutex;

use crate::feature_ports::{ensure_feature_name, FeatureRepository};
use crate::resolution::{self, AssociationChange};

#[derive(Debug, Default)]
struct Store {
    /// name → global state
    features: BTreeMap<String, bool>,
    /// name → entities with an override
    associations: BTreeMap<String, BTreeSet<FeaturableKey>>,
}

impl Store {
    fn global_state(&self, name: &str) -> Result<bool> {
        self.features.get(name).copied().ok_or_else(|| FeatureGateError::feature_not_found(name))
    }

    fn is_attached(&self, name: &str, featurable: &FeaturableKey) -> bool {
        self.associations.get(name).is_some_and(|set| set.contains(featurable))
    }
}

/// [`FeatureRepository`] backed by ordered maps.
#[derive(Debug, Default)]
pub struct InMemoryFeatureRepository {
    store: Mutex<Store>,
}

impl InMemoryFeatureRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of association rows for a feature (zero when unknown).
    pub async fn association_count(&self, name: &str) -> usize {
        let store = self.store.lock().await;
        store.associations.get(name).map_or(0, BTreeSet::len)
    }
}

#[async_trait]
impl FeatureRepository for InMemoryFeatureRepository {
    async fn save(&self, feature: &Feature) -> Result<()> {
        ensure_feature_name(feature.name())?;
        let mut store = self.store.lock().await;
        store.features.insert(feature.name().to_string(), feature.is_enabled());
        Ok(())
    }

    async fn remove(&self, feature: &Feature) -> Result<()> {
        ensure_feature_name(feature.name())?;
        let mut store = self.store.lock().await;
        if store.features.remove(feature.name()).is_none() {
            return Err(FeatureGateError::feature_not_found(feature.name()));
        }
        store.associations.remove(feature.name());
        Ok(())
    }

    async fn find_by_name(&self, name: &str) -> Result<Feature> {
        ensure_feature_name(name)?;
        let store = self.store.lock().await;
        let enabled = store.global_state(name)?;
        Ok(Feature::from_name_and_status(name, enabled))
    }

    async fn enable_for(
        &self,
        name: &str,
        featurable: &FeaturableKey,
    ) -> Result<AssociationChange> {
        ensure_feature_name(name)?;
        let mut store = self.store.lock().await;
        let globally_enabled = store.global_state(name)?;
        let change =
            resolution::plan_enable_for(globally_enabled, store.is_attached(name, featurable));

        if change == AssociationChange::Attach {
            store.associations.entry(name.to_string()).or_default().insert(featurable.clone());
        }
        Ok(change)
    }

    async fn disable_for(
        &self,
        name: &str,
        featurable: &FeaturableKey,
    ) -> Result<AssociationChange> {
        ensure_feature_name(name)?;
        let mut store = self.store.lock().await;
        let globally_enabled = store.global_state(name)?;
        let change =
            resolution::plan_disable_for(globally_enabled, store.is_attached(name, featurable));

        if change == AssociationChange::Detach {
            if let Some(set) = store.associations.get_mut(name) {
                set.remove(featurable);
            }
        }
        Ok(change)
    }

    async fn is_enabled_for(&self, name: &str, featurable: &FeaturableKey) -> Result<bool> {
        ensure_feature_name(name)?;
        let store = self.store.lock().await;
        let globally_enabled = store.global_state(name)?;
        Ok(resolution::resolve(globally_enabled, || store.is_attached(name, featurable)))
    }

    async fn has_association(&self, name: &str, featurable: &FeaturableKey) -> Result<bool> {
        ensure_feature_name(name)?;
        let store = self.store.lock().await;
        store.global_state(name)?;
        Ok(store.is_attached(name, featurable))
    }

    async fn list_all(&self) -> Result<Vec<Feature>> {
        let store = self.store.lock().await;
        Ok(store
            .features
            .iter()
            .map(|(name, enabled)| Feature::from_name_and_status(name.clone(), *enabled))
            .collect())
    }

    async fn features_for(&self, featurable: &FeaturableKey) -> Result<Vec<Feature>> {
        let store = self.store.lock().await;
        Ok(store
            .features
            .iter()
            .filter(|(name, _)| store.is_attached(name, featurable))
            .map(|(name, enabled)| Feature::from_name_and_status(name.clone(), *enabled))
            .collect())
    }
}
