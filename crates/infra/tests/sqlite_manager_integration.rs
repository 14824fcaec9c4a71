//! End-to-end coverage of `FeatureManager` over the SQLite repository.
//!
//! Each test operates on an isolated database file with migrations applied.

mod support;

use featuregate_core::{AssociationChange, UnchangedReason};
use featuregate_domain::FeatureGateError;
use support::{features_on, Account, TestDatabase};

#[tokio::test(flavor = "multi_thread")]
async fn dark_mode_rollout_scenario() {
    let db = TestDatabase::new();
    let features = db.features();
    let user_a = Account { id: 1 };
    let user_b = Account { id: 2 };

    features.add("dark-mode", None).await.expect("added");
    assert!(!features.is_enabled("dark-mode").await.expect("global"));

    features.enable_for("dark-mode", &user_a).await.expect("enable_for A");
    assert!(features.is_enabled_for("dark-mode", &user_a).await.expect("A"));
    assert!(!features.is_enabled_for("dark-mode", &user_b).await.expect("B"));

    features.enable("dark-mode").await.expect("enable globally");
    assert!(features.is_enabled_for("dark-mode", &user_b).await.expect("B after global"));

    features.remove("dark-mode").await.expect("removed");
    assert_eq!(db.count("SELECT COUNT(*) FROM featurables"), 0);
    assert!(features.is_enabled("dark-mode").await.expect_err("gone").is_not_found());
    assert!(features.is_enabled_for("dark-mode", &user_a).await.expect_err("gone").is_not_found());
}

#[tokio::test(flavor = "multi_thread")]
async fn state_survives_reopening_the_database() {
    let db = TestDatabase::new();
    let account = Account { id: 77 };
    {
        let features = db.features();
        features.add("search", Some(false)).await.expect("added");
        features.add("billing", Some(true)).await.expect("added");
        features.enable_for("search", &account).await.expect("enable_for");
    }

    let reopened = features_on(db.reopen());

    assert!(reopened.is_enabled("billing").await.expect("billing"));
    assert!(!reopened.is_enabled("search").await.expect("search"));
    assert!(reopened.has_feature("search", &account).await.expect("association"));
    assert!(reopened.is_enabled_for("search", &account).await.expect("resolved"));
}

#[tokio::test(flavor = "multi_thread")]
async fn global_enable_leaves_association_table_untouched() {
    let db = TestDatabase::new();
    let features = db.features();
    features.add("search", Some(true)).await.expect("added");

    for id in 0..5 {
        let account = Account { id };
        assert_eq!(
            features.enable_for("search", &account).await.expect("enable_for"),
            AssociationChange::Unchanged(UnchangedReason::GloballyEnabled)
        );
        assert!(features.is_enabled_for("search", &account).await.expect("resolved"));
    }
    assert_eq!(db.count("SELECT COUNT(*) FROM featurables"), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn has_feature_ignores_global_state() {
    let db = TestDatabase::new();
    let features = db.features();
    let account = Account { id: 3 };
    features.add("search", Some(true)).await.expect("added");

    assert!(features.is_enabled_for("search", &account).await.expect("resolved"));
    assert!(!features.has_feature("search", &account).await.expect("association"));
}

#[tokio::test(flavor = "multi_thread")]
async fn unknown_feature_is_not_found_for_every_verb() {
    let db = TestDatabase::new();
    let features = db.features();
    let account = Account { id: 1 };

    let results = [
        features.is_enabled("ghost").await.map(|_| ()),
        features.enable("ghost").await.map(|_| ()),
        features.disable("ghost").await.map(|_| ()),
        features.remove("ghost").await,
        features.is_enabled_for("ghost", &account).await.map(|_| ()),
        features.enable_for("ghost", &account).await.map(|_| ()),
        features.disable_for("ghost", &account).await.map(|_| ()),
        features.has_feature("ghost", &account).await.map(|_| ()),
    ];

    for result in results {
        assert!(matches!(result, Err(FeatureGateError::NotFound(_))), "got {result:?}");
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_names_are_validation_errors() {
    let db = TestDatabase::new();
    let features = db.features();

    let err = features.add("   ", None).await.expect_err("blank");
    assert!(matches!(err, FeatureGateError::Validation(_)));

    let err = features.add(&"x".repeat(256), None).await.expect_err("too long");
    assert!(matches!(err, FeatureGateError::Validation(_)));
    assert_eq!(db.count("SELECT COUNT(*) FROM features"), 0);
}
