//! SQLite-backed feature repository.
//!
//! Implements the `FeatureRepository` port. Every operation runs inside
//! `spawn_blocking`. Read-then-write verbs open a `BEGIN IMMEDIATE`
//! transaction so the decision and the write observe the same state, and the
//! `UNIQUE(feature_id, featurable_type, featurable_id)` constraint backs that
//! up at the storage layer. Reads spanning the feature and association tables
//! share one deferred transaction.

use std::sync::Arc;

use async_trait::async_trait;
use featuregate_core::resolution::{self, AssociationChange};
use featuregate_core::{ensure_feature_name, FeatureRepository};
use featuregate_domain::{FeatureGateError, FeaturableKey, Feature, Result as DomainResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use tokio::task;
use tracing::debug;

use super::manager::{map_sql_error, DbManager, SqliteConnection};
use crate::errors::map_join_error;

/// Row of the `features` table needed by the resolution rules.
#[derive(Debug, Clone, Copy)]
struct FeatureRow {
    id: i64,
    is_enabled: bool,
}

/// SQLite-backed feature repository.
pub struct SqliteFeatureRepository {
    db: Arc<DbManager>,
}

impl SqliteFeatureRepository {
    /// Create a new repository with the given database manager.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Run `op` on a pooled connection off the async runtime.
    async fn with_connection<T, F>(&self, op: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut SqliteConnection) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<T> {
            let mut conn = db.get_connection()?;
            op(&mut conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl FeatureRepository for SqliteFeatureRepository {
    async fn save(&self, feature: &Feature) -> DomainResult<()> {
        ensure_feature_name(feature.name())?;
        let name = feature.name().to_string();
        let enabled = feature.is_enabled();

        self.with_connection(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;
            upsert_feature(&tx, &name, enabled).map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;
            debug!(feature = %name, enabled, "feature row saved");
            Ok(())
        })
        .await
    }

    async fn remove(&self, feature: &Feature) -> DomainResult<()> {
        ensure_feature_name(feature.name())?;
        let name = feature.name().to_string();

        self.with_connection(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;
            let row = require_feature(&tx, &name)?;
            // Association rows go with it through ON DELETE CASCADE.
            tx.execute("DELETE FROM features WHERE id = ?1", params![row.id])
                .map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;
            debug!(feature = %name, "feature row deleted");
            Ok(())
        })
        .await
    }

    async fn find_by_name(&self, name: &str) -> DomainResult<Feature> {
        ensure_feature_name(name)?;
        let name = name.to_string();

        self.with_connection(move |conn| {
            let row = require_feature(conn, &name)?;
            Ok(Feature::from_name_and_status(name, row.is_enabled))
        })
        .await
    }

    async fn enable_for(
        &self,
        name: &str,
        featurable: &FeaturableKey,
    ) -> DomainResult<AssociationChange> {
        ensure_feature_name(name)?;
        let name = name.to_string();
        let featurable = featurable.clone();

        self.with_connection(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;
            let row = require_feature(&tx, &name)?;
            let attached = association_exists(&tx, row.id, &featurable).map_err(map_sql_error)?;

            let change = resolution::plan_enable_for(row.is_enabled, attached);
            if change == AssociationChange::Attach {
                insert_association(&tx, row.id, &featurable).map_err(map_sql_error)?;
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(change)
        })
        .await
    }

    async fn disable_for(
        &self,
        name: &str,
        featurable: &FeaturableKey,
    ) -> DomainResult<AssociationChange> {
        ensure_feature_name(name)?;
        let name = name.to_string();
        let featurable = featurable.clone();

        self.with_connection(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(map_sql_error)?;
            let row = require_feature(&tx, &name)?;
            let attached = association_exists(&tx, row.id, &featurable).map_err(map_sql_error)?;

            let change = resolution::plan_disable_for(row.is_enabled, attached);
            if change == AssociationChange::Detach {
                delete_association(&tx, row.id, &featurable).map_err(map_sql_error)?;
            }
            tx.commit().map_err(map_sql_error)?;
            Ok(change)
        })
        .await
    }

    async fn is_enabled_for(&self, name: &str, featurable: &FeaturableKey) -> DomainResult<bool> {
        ensure_feature_name(name)?;
        let name = name.to_string();
        let featurable = featurable.clone();

        self.with_connection(move |conn| {
            let tx = read_transaction(conn)?;
            let row = require_feature(&tx, &name)?;
            let enabled = if resolution::needs_association_lookup(row.is_enabled) {
                let attached =
                    association_exists(&tx, row.id, &featurable).map_err(map_sql_error)?;
                resolution::resolve(row.is_enabled, || attached)
            } else {
                true
            };
            tx.commit().map_err(map_sql_error)?;
            Ok(enabled)
        })
        .await
    }

    async fn has_association(&self, name: &str, featurable: &FeaturableKey) -> DomainResult<bool> {
        ensure_feature_name(name)?;
        let name = name.to_string();
        let featurable = featurable.clone();

        self.with_connection(move |conn| {
            let tx = read_transaction(conn)?;
            let row = require_feature(&tx, &name)?;
            let attached = association_exists(&tx, row.id, &featurable).map_err(map_sql_error)?;
            tx.commit().map_err(map_sql_error)?;
            Ok(attached)
        })
        .await
    }

    async fn list_all(&self) -> DomainResult<Vec<Feature>> {
        self.with_connection(|conn| query_all_features(conn).map_err(map_sql_error)).await
    }

    async fn features_for(&self, featurable: &FeaturableKey) -> DomainResult<Vec<Feature>> {
        let featurable = featurable.clone();

        self.with_connection(move |conn| {
            query_features_for(conn, &featurable).map_err(map_sql_error)
        })
        .await
    }
}

// ============================================================================
// Synchronous SQL Operations (called inside spawn_blocking)
// ============================================================================

/// Deferred transaction so multi-statement reads share one snapshot.
fn read_transaction(conn: &mut Connection) -> DomainResult<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Deferred).map_err(map_sql_error)
}

fn find_feature(conn: &Connection, name: &str) -> rusqlite::Result<Option<FeatureRow>> {
    conn.query_row(
        "SELECT id, is_enabled FROM features WHERE name = ?1",
        params![name],
        |row| Ok(FeatureRow { id: row.get(0)?, is_enabled: row.get::<_, i64>(1)? != 0 }),
    )
    .optional()
}

fn require_feature(conn: &Connection, name: &str) -> DomainResult<FeatureRow> {
    find_feature(conn, name)
        .map_err(map_sql_error)?
        .ok_or_else(|| FeatureGateError::feature_not_found(name))
}

/// Insert or overwrite a feature's global state (SQLite 3.24.0+ upsert).
fn upsert_feature(conn: &Connection, name: &str, enabled: bool) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "INSERT INTO features (name, is_enabled, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT(name) DO UPDATE SET
            is_enabled = excluded.is_enabled,
            updated_at = excluded.updated_at",
        params![name, i64::from(enabled), now],
    )?;
    Ok(())
}

fn association_exists(
    conn: &Connection,
    feature_id: i64,
    featurable: &FeaturableKey,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(
            SELECT 1 FROM featurables
            WHERE feature_id = ?1 AND featurable_type = ?2 AND featurable_id = ?3
         )",
        params![feature_id, featurable.kind(), featurable.id()],
        |row| row.get::<_, i64>(0),
    )
    .map(|exists| exists != 0)
}

fn insert_association(
    conn: &Connection,
    feature_id: i64,
    featurable: &FeaturableKey,
) -> rusqlite::Result<()> {
    let now = chrono::Utc::now().timestamp();

    conn.execute(
        "INSERT INTO featurables (feature_id, featurable_type, featurable_id, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![feature_id, featurable.kind(), featurable.id(), now],
    )?;
    Ok(())
}

fn delete_association(
    conn: &Connection,
    feature_id: i64,
    featurable: &FeaturableKey,
) -> rusqlite::Result<()> {
    conn.execute(
        "DELETE FROM featurables
         WHERE feature_id = ?1 AND featurable_type = ?2 AND featurable_id = ?3",
        params![feature_id, featurable.kind(), featurable.id()],
    )?;
    Ok(())
}

fn query_all_features(conn: &Connection) -> rusqlite::Result<Vec<Feature>> {
    let mut stmt = conn.prepare("SELECT name, is_enabled FROM features ORDER BY name")?;
    let rows = stmt.query_map(params![], |row| {
        Ok(Feature::from_name_and_status(row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
    })?;
    rows.collect()
}

fn query_features_for(
    conn: &Connection,
    featurable: &FeaturableKey,
) -> rusqlite::Result<Vec<Feature>> {
    let mut stmt = conn.prepare(
        "SELECT f.name, f.is_enabled
         FROM features f
         JOIN featurables a ON a.feature_id = f.id
         WHERE a.featurable_type = ?1 AND a.featurable_id = ?2
         ORDER BY f.name",
    )?;
    let rows = stmt.query_map(params![featurable.kind(), featurable.id()], |row| {
        Ok(Feature::from_name_and_status(row.get::<_, String>(0)?, row.get::<_, i64>(1)? != 0))
    })?;
    rows.collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use featuregate_core::resolution::UnchangedReason;
    use tempfile::TempDir;

    use super::*;

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_is_an_upsert() {
        let (repo, mgr, _dir) = setup().await;

        repo.save(&Feature::new("search", false)).await.expect("first save");
        repo.save(&Feature::new("search", true)).await.expect("second save");

        let feature = repo.find_by_name("search").await.expect("found");
        assert!(feature.is_enabled());
        assert_eq!(count_rows(&mgr, "SELECT COUNT(*) FROM features"), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_find_missing_feature_is_not_found() {
        let (repo, _mgr, _dir) = setup().await;

        let err = repo.find_by_name("ghost").await.expect_err("missing");
        assert_eq!(err, FeatureGateError::feature_not_found("ghost"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_enable_for_writes_exactly_one_row() {
        let (repo, mgr, _dir) = setup().await;
        let user = FeaturableKey::new("user", "7");
        repo.save(&Feature::new("search", false)).await.expect("saved");

        let first = repo.enable_for("search", &user).await.expect("first");
        let second = repo.enable_for("search", &user).await.expect("second");

        assert_eq!(first, AssociationChange::Attach);
        assert_eq!(second, AssociationChange::Unchanged(UnchangedReason::AlreadyAttached));
        assert_eq!(count_rows(&mgr, "SELECT COUNT(*) FROM featurables"), 1);
        assert!(repo.is_enabled_for("search", &user).await.expect("query"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_globally_enabled_feature_ignores_entity_writes() {
        let (repo, mgr, _dir) = setup().await;
        let user = FeaturableKey::new("user", "7");
        repo.save(&Feature::new("search", true)).await.expect("saved");

        let enabled = repo.enable_for("search", &user).await.expect("enable_for");
        let disabled = repo.disable_for("search", &user).await.expect("disable_for");

        assert_eq!(enabled, AssociationChange::Unchanged(UnchangedReason::GloballyEnabled));
        assert_eq!(disabled, AssociationChange::Unchanged(UnchangedReason::GloballyEnabled));
        assert_eq!(count_rows(&mgr, "SELECT COUNT(*) FROM featurables"), 0);
        assert!(repo.is_enabled_for("search", &user).await.expect("query"));
        assert!(!repo.has_association("search", &user).await.expect("association"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_disable_for_removes_override() {
        let (repo, _mgr, _dir) = setup().await;
        let user = FeaturableKey::new("user", "7");
        repo.save(&Feature::new("search", false)).await.expect("saved");
        repo.enable_for("search", &user).await.expect("enable_for");

        assert_eq!(
            repo.disable_for("search", &user).await.expect("disable"),
            AssociationChange::Detach
        );
        assert_eq!(
            repo.disable_for("search", &user).await.expect("disable again"),
            AssociationChange::Unchanged(UnchangedReason::NotAttached)
        );
        assert!(!repo.is_enabled_for("search", &user).await.expect("query"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_overrides_survive_global_toggle() {
        let (repo, _mgr, _dir) = setup().await;
        let user = FeaturableKey::new("user", "3");
        repo.save(&Feature::new("search", false)).await.expect("saved");
        repo.enable_for("search", &user).await.expect("enable_for");

        repo.save(&Feature::new("search", true)).await.expect("enable");
        repo.save(&Feature::new("search", false)).await.expect("disable");

        assert!(repo.has_association("search", &user).await.expect("association"));
        assert!(repo.is_enabled_for("search", &user).await.expect("query"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_entity_kind_is_part_of_the_key() {
        let (repo, _mgr, _dir) = setup().await;
        let user = FeaturableKey::new("user", "42");
        let team = FeaturableKey::new("team", "42");
        repo.save(&Feature::new("billing", false)).await.expect("saved");

        repo.enable_for("billing", &team).await.expect("enable_for");

        assert!(repo.is_enabled_for("billing", &team).await.expect("team"));
        assert!(!repo.is_enabled_for("billing", &user).await.expect("user"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_remove_cascades_to_associations() {
        let (repo, mgr, _dir) = setup().await;
        let user = FeaturableKey::new("user", "1");
        let feature = Feature::new("search", false);
        repo.save(&feature).await.expect("saved");
        repo.enable_for("search", &user).await.expect("enable_for");

        repo.remove(&feature).await.expect("removed");

        assert_eq!(count_rows(&mgr, "SELECT COUNT(*) FROM featurables"), 0);
        assert!(repo.is_enabled_for("search", &user).await.expect_err("gone").is_not_found());
        assert!(repo.remove(&feature).await.expect_err("gone twice").is_not_found());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_all_and_features_for_are_ordered_by_name() {
        let (repo, _mgr, _dir) = setup().await;
        let user = FeaturableKey::new("user", "9");
        for (name, enabled) in [("charlie", false), ("alpha", true), ("bravo", false)] {
            repo.save(&Feature::new(name, enabled)).await.expect("saved");
        }
        repo.enable_for("charlie", &user).await.expect("charlie");
        repo.enable_for("bravo", &user).await.expect("bravo");

        let all: Vec<String> =
            repo.list_all().await.expect("list").iter().map(|f| f.name().to_string()).collect();
        assert_eq!(all, vec!["alpha", "bravo", "charlie"]);

        let attached: Vec<String> = repo
            .features_for(&user)
            .await
            .expect("features_for")
            .iter()
            .map(|f| f.name().to_string())
            .collect();
        assert_eq!(attached, vec!["bravo", "charlie"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_unique_constraint_rejects_duplicate_association() {
        let (repo, mgr, _dir) = setup().await;
        let user = FeaturableKey::new("user", "7");
        repo.save(&Feature::new("search", false)).await.expect("saved");
        repo.enable_for("search", &user).await.expect("enable_for");

        let conn = mgr.get_connection().expect("connection acquired");
        let feature_id: i64 = conn
            .query_row("SELECT id FROM features WHERE name = 'search'", [], |row| row.get(0))
            .expect("id");
        let err = insert_association(&conn, feature_id, &user).expect_err("duplicate");
        assert!(matches!(map_sql_error(err), FeatureGateError::Storage(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_enable_for_creates_one_row() {
        let (repo, mgr, _dir) = setup().await;
        let repo = Arc::new(repo);
        let user = FeaturableKey::new("user", "7");
        repo.save(&Feature::new("search", false)).await.expect("saved");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = Arc::clone(&repo);
            let user = user.clone();
            handles.push(tokio::spawn(async move { repo.enable_for("search", &user).await }));
        }

        let mut attached = 0;
        for handle in handles {
            if handle.await.expect("task joined").expect("enable_for") == AssociationChange::Attach
            {
                attached += 1;
            }
        }

        assert_eq!(attached, 1);
        assert_eq!(count_rows(&mgr, "SELECT COUNT(*) FROM featurables"), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_reads_racing_remove_see_feature_or_not_found() {
        let (repo, _mgr, _dir) = setup().await;
        let repo = Arc::new(repo);
        let user = FeaturableKey::new("user", "5");
        let feature = Feature::new("search", false);

        for _ in 0..20 {
            repo.save(&feature).await.expect("saved");
            repo.enable_for("search", &user).await.expect("enable_for");

            let mut readers = Vec::new();
            for _ in 0..4 {
                let repo = Arc::clone(&repo);
                let user = user.clone();
                readers.push(tokio::spawn(async move {
                    (
                        repo.is_enabled_for("search", &user).await,
                        repo.has_association("search", &user).await,
                    )
                }));
            }
            repo.remove(&feature).await.expect("removed");

            for reader in readers {
                let (enabled, attached) = reader.await.expect("task joined");
                for result in [enabled, attached] {
                    match result {
                        Ok(value) => assert!(value, "feature row seen without its association"),
                        Err(err) => assert!(err.is_not_found(), "{err:?}"),
                    }
                }
            }
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_empty_name_is_rejected_before_storage() {
        let (repo, _mgr, _dir) = setup().await;

        let err = repo.find_by_name("").await.expect_err("empty");
        assert!(matches!(err, FeatureGateError::Validation(_)));
    }

    fn count_rows(mgr: &DbManager, sql: &str) -> i64 {
        let conn = mgr.get_connection().expect("connection acquired");
        conn.query_row(sql, [], |row| row.get(0)).expect("count")
    }

    /// Set up a test repository with fresh database.
    async fn setup() -> (SqliteFeatureRepository, Arc<DbManager>, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir created");
        let db_path = temp_dir.path().join("features.db");

        let mgr = Arc::new(DbManager::new(&db_path, 4).expect("db manager created"));
        mgr.run_migrations().expect("migrations run");

        let repo = SqliteFeatureRepository::new(Arc::clone(&mgr));
        (repo, mgr, temp_dir)
    }
}
