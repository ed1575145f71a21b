//! Integration tests for lifelog storage, sync state, and user settings.
//!
//! All tests are ignored by default; run with `--ignored` against a
//! PostgreSQL instance reachable via DATABASE_URL.

use chrono::{NaiveDate, TimeZone, Utc};
use daybook_db::test_fixtures::TestDatabase;
use daybook_db::{
    LifelogCategory, LifelogRepository, NewLifelog, SyncStateRepository, SyncStatus,
    UpsertOutcome, UserSettingsRepository,
};
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn lifelog(user_id: Uuid, remote_id: &str, hour: u32) -> NewLifelog {
    NewLifelog {
        remote_id: remote_id.to_string(),
        user_id,
        date: date(2025, 9, 24),
        title: Some("Morning standup".to_string()),
        summary: Some("Discussed the release checklist".to_string()),
        markdown_content: None,
        category: LifelogCategory::Meeting,
        started_at: Utc.with_ymd_and_hms(2025, 9, 24, hour, 0, 0).unwrap(),
        ended_at: None,
    }
}

#[tokio::test]
#[ignore] // Requires a reachable PostgreSQL (DATABASE_URL)
async fn test_lifelog_upsert_transitions() {
    let test_db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();
    let entry = lifelog(user_id, "pendant-entry-1", 9);

    let outcome = test_db
        .db
        .lifelogs
        .upsert(entry.clone(), false)
        .await
        .expect("first upsert failed");
    assert_eq!(outcome, UpsertOutcome::Inserted);

    // Identical payload: skipped.
    let outcome = test_db
        .db
        .lifelogs
        .upsert(entry.clone(), false)
        .await
        .expect("second upsert failed");
    assert_eq!(outcome, UpsertOutcome::Unchanged);

    // Force rewrites even when nothing changed.
    let outcome = test_db
        .db
        .lifelogs
        .upsert(entry.clone(), true)
        .await
        .expect("forced upsert failed");
    assert_eq!(outcome, UpsertOutcome::Updated);

    // Changed summary: updated in place under the same remote id.
    let changed = NewLifelog {
        summary: Some("Discussed the release checklist and the rollback plan".to_string()),
        ..entry
    };
    let outcome = test_db
        .db
        .lifelogs
        .upsert(changed, false)
        .await
        .expect("changed upsert failed");
    assert_eq!(outcome, UpsertOutcome::Updated);

    let stored = test_db
        .db
        .lifelogs
        .get_by_remote_id("pendant-entry-1")
        .await
        .expect("get_by_remote_id failed")
        .expect("entry missing");
    assert_eq!(stored.category, LifelogCategory::Meeting);
    assert!(stored
        .summary
        .as_deref()
        .unwrap()
        .contains("rollback plan"));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires a reachable PostgreSQL (DATABASE_URL)
async fn test_lifelog_listing_orders_by_start() {
    let test_db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();

    // Insert out of chronological order.
    for (remote_id, hour) in [("entry-b", 14), ("entry-a", 9), ("entry-c", 18)] {
        test_db
            .db
            .lifelogs
            .upsert(lifelog(user_id, remote_id, hour), false)
            .await
            .expect("seed upsert failed");
    }

    let entries = test_db
        .db
        .lifelogs
        .list_for_date(user_id, date(2025, 9, 24))
        .await
        .expect("list_for_date failed");
    assert_eq!(
        entries.iter().map(|e| e.remote_id.as_str()).collect::<Vec<_>>(),
        vec!["entry-a", "entry-b", "entry-c"]
    );

    let ranged = test_db
        .db
        .lifelogs
        .list_range(user_id, date(2025, 9, 24), date(2025, 9, 25))
        .await
        .expect("list_range failed");
    assert_eq!(ranged.len(), 3);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires a reachable PostgreSQL (DATABASE_URL)
async fn test_sync_state_lifecycle() {
    let test_db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();

    assert!(test_db
        .db
        .sync_state
        .get(user_id)
        .await
        .expect("get failed")
        .is_none());

    let state = test_db
        .db
        .sync_state
        .get_or_create(user_id)
        .await
        .expect("get_or_create failed");
    assert_eq!(state.status, SyncStatus::Idle);
    assert_eq!(state.sync_count, 0);

    // Second call returns the existing row.
    let again = test_db
        .db
        .sync_state
        .get_or_create(user_id)
        .await
        .expect("second get_or_create failed");
    assert_eq!(again.user_id, user_id);

    // Whole-row save round-trips status and counters.
    let mut updated = state;
    updated.status = SyncStatus::Success;
    updated.insights_fetched = 12;
    updated.insights_added = 3;
    updated.lifelogs_fetched = 40;
    updated.error_message = None;
    test_db
        .db
        .sync_state
        .save(&updated)
        .await
        .expect("save failed");

    let loaded = test_db
        .db
        .sync_state
        .get(user_id)
        .await
        .expect("get failed")
        .expect("state missing");
    assert_eq!(loaded.status, SyncStatus::Success);
    assert_eq!(loaded.insights_fetched, 12);
    assert_eq!(loaded.insights_added, 3);
    assert_eq!(loaded.lifelogs_fetched, 40);

    let count = test_db
        .db
        .sync_state
        .increment_sync_count(user_id)
        .await
        .expect("increment failed");
    assert_eq!(count, 1);
    let count = test_db
        .db
        .sync_state
        .increment_sync_count(user_id)
        .await
        .expect("increment failed");
    assert_eq!(count, 2);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires a reachable PostgreSQL (DATABASE_URL)
async fn test_increment_sync_count_requires_row() {
    let test_db = TestDatabase::new().await;

    let err = test_db
        .db
        .sync_state
        .increment_sync_count(Uuid::new_v4())
        .await
        .expect_err("expected missing state error");
    assert!(err.to_string().contains("sync state"));

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires a reachable PostgreSQL (DATABASE_URL)
async fn test_user_settings_upsert_and_clear() {
    let test_db = TestDatabase::new().await;
    let user_id = Uuid::new_v4();

    let settings = test_db
        .db
        .users
        .upsert(user_id, Some("America/New_York"), Some("key-123"))
        .await
        .expect("first upsert failed");
    assert_eq!(settings.timezone.as_deref(), Some("America/New_York"));
    assert_eq!(settings.pendant_api_key.as_deref(), Some("key-123"));

    // None clears stored values.
    let cleared = test_db
        .db
        .users
        .upsert(user_id, Some("Europe/Berlin"), None)
        .await
        .expect("second upsert failed");
    assert_eq!(cleared.timezone.as_deref(), Some("Europe/Berlin"));
    assert_eq!(cleared.pendant_api_key, None);

    test_db.cleanup().await;
}

#[tokio::test]
#[ignore] // Requires a reachable PostgreSQL (DATABASE_URL)
async fn test_list_with_credentials_filters() {
    let test_db = TestDatabase::new().await;
    let with_key = Uuid::new_v4();
    let without_key = Uuid::new_v4();

    test_db
        .db
        .users
        .upsert(with_key, Some("UTC"), Some("key-abc"))
        .await
        .expect("upsert failed");
    test_db
        .db
        .users
        .upsert(without_key, Some("UTC"), None)
        .await
        .expect("upsert failed");

    let credentialed = test_db
        .db
        .users
        .list_with_credentials()
        .await
        .expect("list_with_credentials failed");
    let ids: Vec<Uuid> = credentialed.iter().map(|s| s.user_id).collect();
    assert!(ids.contains(&with_key));
    assert!(!ids.contains(&without_key));

    test_db.cleanup().await;
}
