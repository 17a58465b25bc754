// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The canonical output artifact of a worker, keyed by `(source_type,
//! source_id)` with upsert semantics (§3, §4.A).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a stored document.
    pub struct DocumentId("doc-");
}

/// `(source_type, source_id)` upserts are idempotent; the latest content
/// wins and tags accrete (union, de-duplicated) rather than replace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub source_type: String,
    pub source_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub title: String,
    pub content_markdown: String,
    pub detail_level: String,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced: Option<chrono::DateTime<chrono::Utc>>,
}

impl Document {
    pub fn new(
        source_type: impl Into<String>,
        source_id: impl Into<String>,
        title: impl Into<String>,
        content_markdown: impl Into<String>,
        detail_level: impl Into<String>,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: DocumentId::new(),
            source_type: source_type.into(),
            source_id: source_id.into(),
            url: None,
            title: title.into(),
            content_markdown: content_markdown.into(),
            detail_level: detail_level.into(),
            metadata: HashMap::new(),
            tags: Vec::new(),
            created_at: now,
            updated_at: now,
            last_synced: None,
        }
    }

    /// The upsert key (§3: uniqueness is `(source_type, source_id)`).
    pub fn key(&self) -> (&str, &str) {
        (&self.source_type, &self.source_id)
    }

    /// A row is fresh when `now - last_synced < cache_hours` (§4.A). The
    /// store never expires rows itself; this is a helper for callers
    /// (workers) deciding whether to reuse or refetch.
    pub fn is_fresh(&self, now: chrono::DateTime<chrono::Utc>, cache_hours: i64) -> bool {
        match self.last_synced {
            Some(last_synced) => now - last_synced < chrono::Duration::hours(cache_hours),
            None => false,
        }
    }

    /// Merge `incoming` into `self` per the upsert rule: latest content wins,
    /// tags accrete, `last_synced` always advances. `self.id`/`created_at`
    /// are preserved; the caller is expected to have matched on [`Document::key`].
    pub fn merge_upsert(&mut self, incoming: Document) {
        self.url = incoming.url.or_else(|| self.url.take());
        self.title = incoming.title;
        self.content_markdown = incoming.content_markdown;
        self.detail_level = incoming.detail_level;
        for (k, v) in incoming.metadata {
            self.metadata.insert(k, v);
        }
        for tag in incoming.tags {
            if !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
        self.updated_at = incoming.updated_at;
        self.last_synced = Some(incoming.last_synced.unwrap_or(incoming.updated_at));
    }

    crate::setters! {
        into { url: String }
        set { tags: Vec<String>, metadata: HashMap<String, serde_json::Value> }
    }
}

/// Query options for Document Store lookups (§4.A). `tags` apply with AND
/// semantics across tags; `metadata_filters` match by exact equality or,
/// when the filter value is a JSON array, CSV-IN (value must be one of the
/// array's elements).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_type: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata_filters: HashMap<String, serde_json::Value>,
    /// Only return documents whose `last_synced` is older than this, or
    /// documents never synced — used for cache-freshness checks.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stale_before: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

impl SearchOptions {
    /// Does `doc` satisfy this filter set? Free-text `query` matching against
    /// title/content is left to the caller (the store does substring
    /// matching; a future full-text index would live behind the same call).
    pub fn matches(&self, doc: &Document) -> bool {
        if let Some(st) = &self.source_type {
            if &doc.source_type != st {
                return false;
            }
        }
        if !self.tags.iter().all(|t| doc.tags.contains(t)) {
            return false;
        }
        for (key, filter) in &self.metadata_filters {
            let Some(actual) = doc.metadata.get(key) else { return false };
            let matched = match filter.as_array() {
                Some(options) => options.contains(actual),
                None => actual == filter,
            };
            if !matched {
                return false;
            }
        }
        if let Some(stale_before) = self.stale_before {
            match doc.last_synced {
                Some(last_synced) if last_synced < stale_before => {}
                None => {}
                _ => return false,
            }
        }
        true
    }

    crate::setters! {
        into { source_type: String }
        set { tags: Vec<String>, metadata_filters: HashMap<String, serde_json::Value>, limit: usize }
    }
}
