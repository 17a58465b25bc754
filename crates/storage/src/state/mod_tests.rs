// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use qo_core::test_support::*;
use qo_core::{Event, FakeClock, JobStatus};

#[test]
fn job_created_is_idempotent_under_replay() {
    let clock = FakeClock::new();
    let job = sample_root_job(&clock);
    let event = job_created_event(job.clone());

    let mut state = MaterializedState::default();
    state.apply_event(&event);
    state.apply_event(&event);

    assert_eq!(state.jobs.len(), 1);
    assert_eq!(state.get_job(job.id.as_str()).unwrap().id, job.id);
}

#[test]
fn job_status_changed_rejects_regression_but_accepts_terminal_replay() {
    let clock = FakeClock::new();
    let job = sample_root_job(&clock);
    let mut state = MaterializedState::default();
    state.apply_event(&job_created_event(job.clone()));
    state.apply_event(&job_status_changed_event(job.id, JobStatus::Running, &clock));
    state.apply_event(&job_failed_event(job.id, "boom", &clock));

    // Replaying the same terminal status twice is a no-op, not an error.
    state.apply_event(&job_failed_event(job.id, "boom", &clock));
    assert_eq!(state.get_job(job.id.as_str()).unwrap().status, JobStatus::Failed);

    // A regression back to Running is rejected, not applied.
    state.apply_event(&job_status_changed_event(job.id, JobStatus::Running, &clock));
    assert_eq!(state.get_job(job.id.as_str()).unwrap().status, JobStatus::Failed);
}

#[test]
fn job_logs_aggregate_under_root_id_regardless_of_emitter() {
    let root = sample_root_job(&FakeClock::new());
    let mut state = MaterializedState::default();
    state.apply_event(&job_log_appended_event(root.id, "step started"));
    state.apply_event(&job_log_appended_event(root.id, "step finished"));

    let logs = state.logs_for_run(root.id);
    assert_eq!(logs.len(), 2);
    assert_eq!(logs[0].message, "step started");
}

#[test]
fn job_metadata_updated_merges_entries() {
    let clock = FakeClock::new();
    let job = sample_root_job(&clock);
    let mut state = MaterializedState::default();
    state.apply_event(&job_created_event(job.clone()));

    state.apply_event(&Event::JobMetadataUpdated {
        job_id: job.id,
        metadata: [("init_result".to_string(), serde_json::json!({"total_count": 3}))].into(),
    });
    state.apply_event(&Event::JobMetadataUpdated {
        job_id: job.id,
        metadata: [("other".to_string(), serde_json::json!(true))].into(),
    });

    let stored = state.get_job(job.id.as_str()).unwrap();
    assert_eq!(stored.metadata["init_result"]["total_count"], 3);
    assert_eq!(stored.metadata["other"], true);
}

#[test]
fn document_upsert_then_upsert_merges_by_source_key() {
    let mut doc = sample_document();
    doc.tags = vec!["tech".into()];
    let mut state = MaterializedState::default();
    state.apply_event(&document_upserted_event(doc.clone()));

    let mut second = doc.clone();
    second.tags = vec!["nasdaq".into()];
    second.content_markdown = "updated".into();
    state.apply_event(&document_upserted_event(second));

    assert_eq!(state.documents.len(), 1);
    let stored = state.get_document_by_source("equities", "AAPL").unwrap();
    assert_eq!(stored.content_markdown, "updated");
    assert_eq!(stored.tags, vec!["tech", "nasdaq"]);
}

#[test]
fn get_document_by_source_is_none_for_unknown_source() {
    let state = MaterializedState::default();
    assert!(state.get_document_by_source("equities", "UNKNOWN").is_none());
}

#[test]
fn search_documents_applies_search_options() {
    let mut state = MaterializedState::default();
    let mut doc = sample_document();
    doc.tags = vec!["fundamentals".into()];
    state.apply_event(&document_upserted_event(doc));

    let mut opts = qo_core::SearchOptions::default();
    opts.tags = vec!["fundamentals".into()];
    assert_eq!(state.search_documents(&opts).len(), 1);

    opts.tags = vec!["nonexistent".into()];
    assert_eq!(state.search_documents(&opts).len(), 0);
}

#[test]
fn tag_index_is_populated_on_upsert_and_cleared_on_delete() {
    let mut doc = sample_document();
    doc.tags = vec!["tech".into()];
    let mut state = MaterializedState::default();
    state.apply_event(&document_upserted_event(doc.clone()));

    assert_eq!(state.tag_index.get("tech").map(Vec::len), Some(1));

    // A later upsert adds the new tag to the index without duplicating the
    // existing entry.
    let mut second = doc.clone();
    second.tags = vec!["nasdaq".into()];
    state.apply_event(&document_upserted_event(second));
    assert_eq!(state.tag_index.get("tech").map(Vec::len), Some(1));
    assert_eq!(state.tag_index.get("nasdaq").map(Vec::len), Some(1));

    state.apply_event(&Event::DocumentDeleted { source_type: doc.source_type.clone(), source_id: doc.source_id.clone() });
    assert!(state.tag_index.get("tech").is_none());
    assert!(state.tag_index.get("nasdaq").is_none());
}

#[test]
fn queue_job_enqueue_lease_ack_lifecycle() {
    let root = sample_root_job(&FakeClock::new());
    let queue_job = sample_queue_job(root.id);
    let job_id = queue_job.id;
    let mut state = MaterializedState::default();

    state.apply_event(&queue_job_enqueued_event(queue_job));
    assert_eq!(state.queue_items[job_id.as_str()].status, QueueItemStatus::Pending);

    state.apply_event(&queue_job_leased_event(job_id, "lease-1", 10_000));
    let item = &state.queue_items[job_id.as_str()];
    assert_eq!(item.status, QueueItemStatus::Leased);
    assert_eq!(item.delivery_count, 1);
    assert!(!item.is_visible(5_000));
    assert!(item.is_visible(10_000));

    state.apply_event(&queue_job_acked_event(job_id, "lease-1"));
    assert_eq!(state.queue_items[job_id.as_str()].status, QueueItemStatus::Acked);
}

#[test]
fn enqueuing_a_queue_job_synthesizes_a_leaf_job_record_under_the_true_root() {
    let clock = FakeClock::new();
    let root = sample_root_job(&clock);
    let step = sample_step_job(root.id, &clock);
    let queue_job = sample_queue_job(step.id);
    let leaf_id = queue_job.id;

    let mut state = MaterializedState::default();
    state.apply_event(&job_created_event(root.clone()));
    state.apply_event(&job_created_event(step.clone()));
    state.apply_event(&queue_job_enqueued_event(queue_job));

    let leaf = state.get_job(leaf_id.as_str()).unwrap();
    assert_eq!(leaf.phase, qo_core::JobPhase::Leaf);
    assert_eq!(leaf.parent_id, root.id);
    assert_eq!(leaf.discovered_by, Some(step.id));

    assert!(!state.all_descendants_terminal(root.id));
    state.apply_event(&job_status_changed_event(step.id, JobStatus::Completed, &clock));
    state.apply_event(&job_status_changed_event(leaf_id, JobStatus::Completed, &clock));
    assert!(state.all_descendants_terminal(root.id));
}

#[test]
fn queue_job_nack_without_requeue_moves_to_dead() {
    let root = sample_root_job(&FakeClock::new());
    let queue_job = sample_queue_job(root.id);
    let job_id = queue_job.id;
    let mut state = MaterializedState::default();

    state.apply_event(&queue_job_enqueued_event(queue_job));
    state.apply_event(&queue_job_leased_event(job_id, "lease-1", 10_000));
    state.apply_event(&Event::QueueJobNacked { job_id, lease_id: "lease-1".into(), requeue: false });

    assert_eq!(state.queue_items[job_id.as_str()].status, QueueItemStatus::Dead);
}

#[test]
fn kv_set_and_delete_roundtrip() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::KvSet { key: "pdf:AAPL:10k".into(), value: serde_json::json!("binary-blob") });
    assert_eq!(state.kv.get("pdf:AAPL:10k"), Some(&serde_json::json!("binary-blob")));

    state.apply_event(&Event::KvDeleted { key: "pdf:AAPL:10k".into() });
    assert!(!state.kv.contains_key("pdf:AAPL:10k"));
}

#[test]
fn all_descendants_terminal_tracks_step_completion() {
    let clock = FakeClock::new();
    let root = sample_root_job(&clock);
    let step = sample_step_job(root.id, &clock);
    let leaf = sample_leaf_job(root.id, step.id, &clock);

    let mut state = MaterializedState::default();
    state.apply_event(&job_created_event(root.clone()));
    state.apply_event(&job_created_event(step.clone()));
    state.apply_event(&job_created_event(leaf.clone()));

    assert!(!state.all_descendants_terminal(root.id));
    assert_eq!(state.pending_descendants(root.id).len(), 2);

    state.apply_event(&job_status_changed_event(step.id, JobStatus::Completed, &clock));
    assert!(!state.all_descendants_terminal(root.id));

    state.apply_event(&job_status_changed_event(leaf.id, JobStatus::Completed, &clock));
    assert!(state.all_descendants_terminal(root.id));
    assert!(state.pending_descendants(root.id).is_empty());
}
