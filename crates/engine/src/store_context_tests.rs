// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use qo_core::test_support::sample_document;
use qo_storage::Store;
use tempfile::tempdir;

fn open_context() -> (tempfile::TempDir, StoreContext) {
    let dir = tempdir().unwrap();
    let store = Store::open(dir.path().join("state.wal")).unwrap();
    (dir, StoreContext::new(store, std::sync::Arc::new(crate::event_bus::EventBus::default())))
}

#[tokio::test]
async fn publish_forwards_to_the_event_bus() {
    let (_dir, ctx) = open_context();
    let mut subscriber = ctx.event_bus.subscribe();
    ctx.publish(qo_core::Event::JobSpawned { job_id: JobId::new(), parent_id: JobId::new(), at_ms: 0 });
    let received = subscriber.recv().await.unwrap();
    assert_eq!(received.kind(), "job_spawn");
}

#[tokio::test]
async fn document_round_trips_through_the_store() {
    let (_dir, ctx) = open_context();
    let doc = sample_document();
    ctx.document_upsert(doc.clone()).await.unwrap();

    let fetched = ctx.document_get_by_source(&doc.source_type, &doc.source_id).await.unwrap();
    assert_eq!(fetched.title, doc.title);
}

#[tokio::test]
async fn kv_round_trips_through_the_store() {
    let (_dir, ctx) = open_context();
    ctx.kv_set("k", serde_json::json!("v")).await.unwrap();
    assert_eq!(ctx.kv_get("k").await, Some(serde_json::json!("v")));
}

#[tokio::test]
async fn enqueue_rejects_an_invalid_queue_job() {
    let (_dir, ctx) = open_context();
    let mut job = qo_core::QueueJob::new(JobId::new(), "crawler_url", "", 1);
    job.name = String::new();
    let result = ctx.enqueue(job).await;
    assert!(result.is_err());
    assert!(!result.unwrap_err().retryable());
}
