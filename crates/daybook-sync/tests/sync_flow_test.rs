//! End-to-end sync flows over in-memory repositories and a scripted source.
//!
//! These run without a database or network; the Postgres repositories have
//! their own ignored integration suite in daybook-db.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use daybook_sync::mock::{MemoryStore, MockPendantSource};
use daybook_sync::{
    reprocess_all, reprocess_date, sync_insights, sync_lifelogs, InsightSyncOptions,
    LifelogCategory, LifelogSyncOptions, NewDocument, RemoteChatSummary, RemoteLifelog,
    SyncContext, SyncStatus,
};

const INSIGHT_BODY: &str = "\
## Key Follow-Ups

### For You to Action
- Book the flight to Lisbon
- Email Dana the contract draft

## Decision Log

### Decisions Made
- Switch the team to fortnightly retros
";

fn summary(id: &str, content: &str, created_at: DateTime<Utc>) -> RemoteChatSummary {
    RemoteChatSummary {
        id: id.to_string(),
        label: Some("Daily Insights".to_string()),
        content: Some(content.to_string()),
        created_at,
    }
}

fn remote_lifelog(id: Option<&str>, title: &str, started_at: DateTime<Utc>) -> RemoteLifelog {
    RemoteLifelog {
        id: id.map(String::from),
        title: Some(title.to_string()),
        summary: None,
        markdown: Some("transcript body".to_string()),
        category: None,
        started_at,
        ended_at: Some(started_at + Duration::minutes(30)),
    }
}

/// Store plus a context over it, with a Pendant credential already saved.
async fn credentialed_context(source: MockPendantSource) -> (MemoryStore, SyncContext, Uuid) {
    let store = MemoryStore::default();
    let user_id = Uuid::new_v4();
    let ctx = store.clone().into_context(Arc::new(source));
    ctx.users
        .upsert(user_id, None, Some("test-key"))
        .await
        .expect("settings upsert failed");
    (store, ctx, user_id)
}

#[tokio::test]
async fn test_insight_sync_stores_document_and_records() {
    let created_at = Utc::now() - Duration::hours(1);
    let source = MockPendantSource::new()
        .with_chat_summaries(vec![summary("s-1", INSIGHT_BODY, created_at)]);
    let (_store, ctx, user_id) = credentialed_context(source).await;

    let report = sync_insights(&ctx, user_id, InsightSyncOptions::default()).await;
    assert!(report.success, "sync failed: {}", report.message);
    assert!(!report.skipped);
    assert_eq!((report.fetched, report.added, report.updated), (1, 1, 0));

    // Content date is the day before the generation instant.
    let expected_date = (created_at - Duration::days(1)).date_naive();
    let document = ctx
        .documents
        .get(user_id, expected_date)
        .await
        .expect("document get failed")
        .expect("document missing");
    assert_eq!(document.content, INSIGHT_BODY);
    assert_eq!(document.source_created_at, Some(created_at));

    let records = ctx
        .records
        .list_for_document(document.id)
        .await
        .expect("record list failed");
    let kinds: Vec<&str> = records.iter().map(|r| r.kind.as_str()).collect();
    assert_eq!(kinds, vec!["action_item", "action_item", "decision"]);
    assert_eq!(
        records[0].payload,
        serde_json::json!("Book the flight to Lisbon")
    );

    let state = ctx
        .sync_state
        .get(user_id)
        .await
        .expect("state get failed")
        .expect("state missing");
    assert_eq!(state.status, SyncStatus::Success);
    assert_eq!(state.sync_count, 1);
    assert_eq!(state.insights_fetched, 1);
    assert_eq!(state.insights_added, 1);
    assert_eq!(state.insights_updated, 0);
    assert!(state.last_insights_sync_at.is_some());
    assert!(state.last_full_sync_at.is_none());
    assert_eq!(state.error_message, None);
}

#[tokio::test]
async fn test_insight_sync_skips_without_credential() {
    let source = MockPendantSource::new()
        .with_chat_summaries(vec![summary("s-1", INSIGHT_BODY, Utc::now())]);
    let store = MemoryStore::default();
    let user_id = Uuid::new_v4();
    let ctx = store.clone().into_context(Arc::new(source.clone()));

    let report = sync_insights(&ctx, user_id, InsightSyncOptions::default()).await;
    assert!(report.success);
    assert!(report.skipped);
    assert_eq!(report.message, "No Pendant API key configured");
    assert_eq!(report.fetched, 0);

    // No remote call, no bookkeeping row.
    assert_eq!(source.call_count("fetch_chat_summaries"), 0);
    assert!(ctx
        .sync_state
        .get(user_id)
        .await
        .expect("state get failed")
        .is_none());
}

#[tokio::test]
async fn test_insight_sync_unchanged_content_skips_rewrite() {
    let created_at = Utc::now() - Duration::minutes(30);
    let source = MockPendantSource::new()
        .with_chat_summaries(vec![summary("s-1", INSIGHT_BODY, created_at)]);
    let (_store, ctx, user_id) = credentialed_context(source).await;

    let first = sync_insights(&ctx, user_id, InsightSyncOptions::default()).await;
    assert_eq!(first.added, 1);

    // Second incremental run refetches the same summary; the hash gate
    // leaves the stored document alone.
    let second = sync_insights(&ctx, user_id, InsightSyncOptions::default()).await;
    assert!(second.success);
    assert_eq!((second.fetched, second.added, second.updated), (1, 0, 0));

    let state = ctx
        .sync_state
        .get(user_id)
        .await
        .expect("state get failed")
        .expect("state missing");
    assert_eq!(state.sync_count, 2);
}

#[tokio::test]
async fn test_insight_sync_replaces_records_on_changed_content() {
    let created_at = Utc::now() - Duration::minutes(30);
    let source = MockPendantSource::new()
        .with_chat_summaries(vec![summary("s-1", INSIGHT_BODY, created_at)]);
    let (store, ctx, user_id) = credentialed_context(source).await;
    sync_insights(&ctx, user_id, InsightSyncOptions::default()).await;

    // The source regenerated the day's document with one more follow-up.
    let changed_body = format!("{}- Renew the passport\n", INSIGHT_BODY);
    let changed_source = MockPendantSource::new()
        .with_chat_summaries(vec![summary("s-1", &changed_body, created_at)]);
    let ctx2 = store.into_context(Arc::new(changed_source));

    let report = sync_insights(&ctx2, user_id, InsightSyncOptions::default()).await;
    assert!(report.success, "sync failed: {}", report.message);
    assert_eq!((report.added, report.updated), (0, 1));

    let expected_date = (created_at - Duration::days(1)).date_naive();
    let document = ctx2
        .documents
        .get(user_id, expected_date)
        .await
        .expect("document get failed")
        .expect("document missing");
    assert_eq!(document.content, changed_body);

    let records = ctx2
        .records
        .list_for_document(document.id)
        .await
        .expect("record list failed");
    assert_eq!(records.len(), 4, "records were not rederived");
}

#[tokio::test]
async fn test_insight_sync_failure_records_error_state() {
    let source = MockPendantSource::new().with_chat_summary_failure();
    let (_store, ctx, user_id) = credentialed_context(source).await;

    let report = sync_insights(&ctx, user_id, InsightSyncOptions::default()).await;
    assert!(!report.success);
    assert!(!report.skipped);
    assert!(report.message.contains("mock chat summary failure"));

    let state = ctx
        .sync_state
        .get(user_id)
        .await
        .expect("state get failed")
        .expect("state missing");
    assert_eq!(state.status, SyncStatus::Error);
    assert!(state
        .error_message
        .as_deref()
        .unwrap()
        .contains("mock chat summary failure"));
    // A failed run never counts as a success for window resumption.
    assert!(state.last_insights_sync_at.is_none());
    assert_eq!(state.sync_count, 0);
}

#[tokio::test]
async fn test_insight_sync_rederives_missing_records() {
    let (_store, ctx, user_id) = credentialed_context(MockPendantSource::new()).await;

    // A document written by an earlier run that died before the record pass.
    let (document, _) = ctx
        .documents
        .upsert(NewDocument {
            user_id,
            date: (Utc::now() - Duration::days(2)).date_naive(),
            content: INSIGHT_BODY.to_string(),
            source_created_at: None,
        })
        .await
        .expect("seed upsert failed");

    let report = sync_insights(&ctx, user_id, InsightSyncOptions::default()).await;
    assert!(report.success, "sync failed: {}", report.message);
    assert_eq!(report.fetched, 0);

    let records = ctx
        .records
        .list_for_document(document.id)
        .await
        .expect("record list failed");
    assert_eq!(records.len(), 3, "recovery pass did not run");
}

#[tokio::test]
async fn test_forced_sync_backfills_beyond_bootstrap_window() {
    let created_at = Utc::now() - Duration::days(10);
    let source = MockPendantSource::new()
        .with_chat_summaries(vec![summary("s-old", INSIGHT_BODY, created_at)]);
    let (_store, ctx, user_id) = credentialed_context(source).await;

    // Bootstrap window only reaches back a few days.
    let first = sync_insights(&ctx, user_id, InsightSyncOptions::default()).await;
    assert!(first.success);
    assert_eq!((first.fetched, first.added), (0, 0));

    let forced = InsightSyncOptions::default()
        .with_force(true)
        .with_lookback_days(30);
    let second = sync_insights(&ctx, user_id, forced).await;
    assert!(second.success);
    assert_eq!((second.fetched, second.added), (1, 1));

    let state = ctx
        .sync_state
        .get(user_id)
        .await
        .expect("state get failed")
        .expect("state missing");
    assert!(state.last_full_sync_at.is_some());
}

#[tokio::test]
async fn test_lifelog_sync_inserts_and_drops_unidentified() {
    let now = Utc::now();
    let source = MockPendantSource::new().with_lifelogs(vec![
        remote_lifelog(Some("ll-1"), "Morning standup", now - Duration::minutes(90)),
        remote_lifelog(Some("ll-2"), "Coffee with Sam", now - Duration::minutes(45)),
        remote_lifelog(None, "Ghost entry", now - Duration::minutes(30)),
    ]);
    let (_store, ctx, user_id) = credentialed_context(source).await;

    let report = sync_lifelogs(&ctx, user_id, LifelogSyncOptions::default()).await;
    assert!(report.success, "sync failed: {}", report.message);
    assert_eq!(report.total_processed, 3);
    assert_eq!((report.synced, report.updated, report.skipped), (2, 0, 0));
    assert_eq!(report.message, "Processed 3 lifelogs: 2 new, 0 updated, 0 unchanged");

    // Category inferred from the title when the source sends none.
    let standup = ctx
        .lifelogs
        .get_by_remote_id("ll-1")
        .await
        .expect("get failed")
        .expect("entry missing");
    assert_eq!(standup.category, LifelogCategory::Meeting);
    let coffee = ctx
        .lifelogs
        .get_by_remote_id("ll-2")
        .await
        .expect("get failed")
        .expect("entry missing");
    assert_eq!(coffee.category, LifelogCategory::Break);

    let state = ctx
        .sync_state
        .get(user_id)
        .await
        .expect("state get failed")
        .expect("state missing");
    assert_eq!(state.status, SyncStatus::Success);
    assert_eq!(state.lifelogs_fetched, 3);
    assert_eq!(state.lifelogs_added, 2);
    assert!(state.last_lifelogs_sync_at.is_some());
    // Only insight syncs advance the census counter.
    assert_eq!(state.sync_count, 0);
}

#[tokio::test]
async fn test_lifelog_sync_idempotent_then_detects_change() {
    let now = Utc::now();
    let source = MockPendantSource::new().with_lifelogs(vec![
        remote_lifelog(Some("ll-1"), "Morning standup", now - Duration::minutes(90)),
        remote_lifelog(Some("ll-2"), "Lunch walk", now - Duration::minutes(45)),
    ]);
    let (store, ctx, user_id) = credentialed_context(source).await;

    let first = sync_lifelogs(&ctx, user_id, LifelogSyncOptions::default()).await;
    assert_eq!(first.synced, 2);

    let second = sync_lifelogs(&ctx, user_id, LifelogSyncOptions::default()).await;
    assert!(second.success);
    assert_eq!(second.total_processed, 2);
    assert_eq!((second.synced, second.updated, second.skipped), (0, 0, 2));

    // The source re-transcribed one entry.
    let mut changed = remote_lifelog(Some("ll-1"), "Morning standup", now - Duration::minutes(90));
    changed.markdown = Some("corrected transcript".to_string());
    let changed_source = MockPendantSource::new().with_lifelogs(vec![
        changed,
        remote_lifelog(Some("ll-2"), "Lunch walk", now - Duration::minutes(45)),
    ]);
    let ctx2 = store.into_context(Arc::new(changed_source));

    let third = sync_lifelogs(&ctx2, user_id, LifelogSyncOptions::default()).await;
    assert_eq!((third.synced, third.updated, third.skipped), (0, 1, 1));

    let stored = ctx2
        .lifelogs
        .get_by_remote_id("ll-1")
        .await
        .expect("get failed")
        .expect("entry missing");
    assert_eq!(stored.markdown_content.as_deref(), Some("corrected transcript"));
}

#[tokio::test]
async fn test_lifelog_sync_failure_records_error_state() {
    let source = MockPendantSource::new().with_lifelog_failure();
    let (_store, ctx, user_id) = credentialed_context(source).await;

    let report = sync_lifelogs(&ctx, user_id, LifelogSyncOptions::default()).await;
    assert!(!report.success);
    assert!(report.message.contains("mock lifelog failure"));

    let state = ctx
        .sync_state
        .get(user_id)
        .await
        .expect("state get failed")
        .expect("state missing");
    assert_eq!(state.status, SyncStatus::Error);
    assert!(state.last_lifelogs_sync_at.is_none());
}

#[tokio::test]
async fn test_lifelog_sync_skips_without_credential() {
    let source = MockPendantSource::new()
        .with_lifelogs(vec![remote_lifelog(Some("ll-1"), "Standup", Utc::now())]);
    let store = MemoryStore::default();
    let user_id = Uuid::new_v4();
    let ctx = store.into_context(Arc::new(source.clone()));

    let report = sync_lifelogs(&ctx, user_id, LifelogSyncOptions::default()).await;
    assert!(report.success);
    assert_eq!(report.message, "No Pendant API key configured");
    assert_eq!(report.total_processed, 0);
    assert_eq!(source.call_count("fetch_lifelogs"), 0);
}

#[tokio::test]
async fn test_reprocess_sweeps_all_documents() {
    let (_store, ctx, user_id) = credentialed_context(MockPendantSource::new()).await;
    let mut ids = Vec::new();
    for days_back in [1, 2] {
        let (document, _) = ctx
            .documents
            .upsert(NewDocument {
                user_id,
                date: (Utc::now() - Duration::days(days_back)).date_naive(),
                content: INSIGHT_BODY.to_string(),
                source_created_at: None,
            })
            .await
            .expect("seed upsert failed");
        ids.push(document.id);
    }

    let report = reprocess_all(&ctx, user_id).await.expect("reprocess failed");
    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 0);
    for id in ids {
        assert!(ctx.records.has_records(id).await.expect("has_records failed"));
    }
}

#[tokio::test]
async fn test_reprocess_isolates_per_document_failures() {
    let (store, ctx, user_id) = credentialed_context(MockPendantSource::new()).await;
    let mut ids = Vec::new();
    for days_back in [1, 2] {
        let (document, _) = ctx
            .documents
            .upsert(NewDocument {
                user_id,
                date: (Utc::now() - Duration::days(days_back)).date_naive(),
                content: INSIGHT_BODY.to_string(),
                source_created_at: None,
            })
            .await
            .expect("seed upsert failed");
        ids.push(document.id);
    }
    store.fail_replace_for(ids[0]);

    let report = reprocess_all(&ctx, user_id).await.expect("reprocess failed");
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    assert!(ctx.records.has_records(ids[1]).await.expect("has_records failed"));
}

#[tokio::test]
async fn test_reprocess_date_without_document_is_empty() {
    let (_store, ctx, user_id) = credentialed_context(MockPendantSource::new()).await;

    let report = reprocess_date(&ctx, user_id, (Utc::now() - Duration::days(3)).date_naive())
        .await
        .expect("reprocess failed");
    assert_eq!(report.processed, 0);
    assert_eq!(report.failed, 0);
}
