//! Association queries for featurable entities.
//!
//! [`FeaturableExt::features`] hands out a lazy [`FeatureLinks`] handle: no
//! query runs until one of its methods is awaited.
//!
//! `has_feature` is an association check only. Global enablement is applied
//! by the repository's `is_enabled_for`, never here.

use featuregate_domain::{Feature, Featurable, FeaturableKey, Result};

use crate::feature_ports::FeatureRepository;

/// Lazy handle over the features explicitly attached to one entity.
pub struct FeatureLinks<'a> {
    repository: &'a dyn FeatureRepository,
    featurable: FeaturableKey,
}

impl<'a> FeatureLinks<'a> {
    pub fn new(repository: &'a dyn FeatureRepository, featurable: FeaturableKey) -> Self {
        Self { repository, featurable }
    }

    pub fn featurable(&self) -> &FeaturableKey {
        &self.featurable
    }

    /// Whether the entity has an association with the named feature.
    ///
    /// # Errors
    /// `NotFound` when the feature does not exist.
    pub async fn has_feature(&self, name: &str) -> Result<bool> {
        self.repository.has_association(name, &self.featurable).await
    }

    /// Materialize the attached features, ordered by name.
    pub async fn list(&self) -> Result<Vec<Feature>> {
        self.repository.features_for(&self.featurable).await
    }

    pub async fn count(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }
}

/// Association access for anything implementing [`Featurable`].
pub trait FeaturableExt: Featurable {
    fn features<'a>(&self, repository: &'a dyn FeatureRepository) -> FeatureLinks<'a> {
        FeatureLinks::new(repository, self.featurable_key())
    }
}

impl<T: Featurable + ?Sized> FeaturableExt for T {}
