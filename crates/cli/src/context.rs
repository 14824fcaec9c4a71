//! Application context - dependency injection container

use std::sync::Arc;

use featuregate_core::FeatureManager;
use featuregate_domain::{Config, Result};
use featuregate_infra::{DbManager, SqliteFeatureRepository};
use tracing::debug;

/// Services shared by every command.
pub struct AppContext {
    pub manager: Arc<FeatureManager>,
}

impl AppContext {
    /// Open the configured database, apply migrations and wire the manager.
    ///
    /// # Errors
    /// `Storage` when the database cannot be opened or migrated.
    pub fn new(config: &Config) -> Result<Self> {
        let db = Arc::new(DbManager::from_config(&config.database)?);
        db.run_migrations()?;

        let repository = Arc::new(SqliteFeatureRepository::new(Arc::clone(&db)));
        let manager = Arc::new(FeatureManager::new(repository));

        debug!(db_path = %db.path().display(), "application context ready");
        Ok(Self { manager })
    }
}
