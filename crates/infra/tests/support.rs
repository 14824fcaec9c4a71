use std::sync::Arc;

use featuregate_core::FeatureManager;
use featuregate_domain::Featurable;
use featuregate_infra::database::{DbManager, SqliteFeatureRepository};
use tempfile::TempDir;

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with migrations applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = open(&temp_dir);
        Self { manager, temp_dir }
    }

    /// Open a second, independent pool on the same file.
    pub fn reopen(&self) -> Arc<DbManager> {
        open(&self.temp_dir)
    }

    /// Feature manager wired to a SQLite repository on this database.
    pub fn features(&self) -> FeatureManager {
        features_on(Arc::clone(&self.manager))
    }

    /// Count rows with a scalar query.
    pub fn count(&self, sql: &str) -> i64 {
        let conn = self.manager.get_connection().expect("connection should be available");
        conn.query_row(sql, [], |row| row.get(0)).expect("count query should succeed")
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

pub fn features_on(db: Arc<DbManager>) -> FeatureManager {
    FeatureManager::new(Arc::new(SqliteFeatureRepository::new(db)))
}

fn open(temp_dir: &TempDir) -> Arc<DbManager> {
    let db_path = temp_dir.path().join("features.db");
    let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
    manager.run_migrations().expect("schema migrations should apply");
    Arc::new(manager)
}

/// Account entity used by the integration suites.
pub struct Account {
    pub id: u64,
}

impl Featurable for Account {
    fn featurable_type(&self) -> &str {
        "account"
    }

    fn featurable_id(&self) -> String {
        self.id.to_string()
    }
}
