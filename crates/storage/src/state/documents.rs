// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document Store event handlers (§4.A). Uniqueness is `(source_type,
//! source_id)`; the `document_key` index maps that pair to a stored id.

use qo_core::Event;

use super::{document_source_key, MaterializedState};

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::DocumentUpserted { document } => {
            let key = document_source_key(&document.source_type, &document.source_id);
            // Idempotent: merge_upsert is itself idempotent (tags union,
            // latest content/timestamp wins regardless of replay order
            // within the same logical write).
            if let Some(existing_id) = state.document_index.get(&key).cloned() {
                if let Some(existing) = state.documents.get_mut(&existing_id) {
                    existing.merge_upsert(document.clone());
                    let tags = existing.tags.clone();
                    index_tags(state, &existing_id, &tags);
                    return;
                }
            }
            index_tags(state, &document.id.to_string(), &document.tags);
            state.document_index.insert(key, document.id.to_string());
            state.documents.insert(document.id.to_string(), document.clone());
        }

        Event::DocumentDeleted { source_type, source_id } => {
            let key = document_source_key(source_type, source_id);
            if let Some(id) = state.document_index.remove(&key) {
                if let Some(document) = state.documents.remove(&id) {
                    for tag in &document.tags {
                        if let Some(ids) = state.tag_index.get_mut(tag) {
                            ids.retain(|existing| existing != &id);
                            if ids.is_empty() {
                                state.tag_index.remove(tag);
                            }
                        }
                    }
                }
            }
        }

        _ => {}
    }
}

/// Tags only ever accrete on upsert (`Document::merge_upsert` unions them),
/// so this only needs to add missing entries, never remove stale ones.
fn index_tags(state: &mut MaterializedState, document_id: &str, tags: &[String]) {
    for tag in tags {
        let ids = state.tag_index.entry(tag.clone()).or_default();
        if !ids.iter().any(|id| id == document_id) {
            ids.push(document_id.to_string());
        }
    }
}
