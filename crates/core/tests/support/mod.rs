//! Shared test helpers for `featuregate-core` integration tests.
//!
//! Provides sample featurable entities and a manager wired to the in-memory
//! repository so tests can focus on behaviour instead of boilerplate.

pub mod entities;

use std::sync::Arc;

use featuregate_core::{FeatureManager, InMemoryFeatureRepository};

/// Manager plus a handle on its repository for row-level assertions.
pub fn manager() -> (FeatureManager, Arc<InMemoryFeatureRepository>) {
    let repository = Arc::new(InMemoryFeatureRepository::new());
    let manager = FeatureManager::new(repository.clone());
    (manager, repository)
}
