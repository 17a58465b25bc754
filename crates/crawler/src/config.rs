// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `CrawlConfig`: the crawler's typed view over `JobStep.config` (§4.J).

use std::collections::HashMap;

use qo_registry::WorkerError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub source_type: String,
    pub start_urls: Vec<String>,
    pub max_depth: u32,
    pub max_pages: u32,
    pub concurrency: u32,
    pub rate_limit_ms: u64,
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    pub render_timeout_ms: u64,
    pub follow_links: bool,
    pub detail_level: String,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub auth_id: Option<String>,
    /// Caching policy shared by fetch-oriented workers: a fresh `Document`
    /// (`now - last_synced < cache_hours`) is reused instead of refetched.
    /// `None` means always refetch.
    pub cache_hours: Option<i64>,
    pub force_refresh: bool,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            source_type: "web".to_string(),
            start_urls: Vec::new(),
            max_depth: 3,
            max_pages: 50,
            concurrency: 1,
            rate_limit_ms: 0,
            retry_attempts: 0,
            retry_backoff_ms: 0,
            render_timeout_ms: 30_000,
            follow_links: true,
            detail_level: "summary".to_string(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            auth_id: None,
            cache_hours: None,
            force_refresh: false,
        }
    }
}

impl CrawlConfig {
    /// Deserialize from a step's schemaless `config` map (§4.J:
    /// `jobDef.base_url`/explicit `start_urls` is resolved by the caller —
    /// the Definition Worker trait only hands `Init` the step, not the full
    /// `JobDefinition` — so at least one `start_urls` entry is required here).
    pub fn from_step_config(config: &HashMap<String, serde_json::Value>) -> Result<Self, WorkerError> {
        let value = serde_json::Value::Object(config.clone().into_iter().collect());
        let parsed: Self = serde_json::from_value(value).map_err(|e| WorkerError::ConfigInvalid(e.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    fn validate(&self) -> Result<(), WorkerError> {
        if self.start_urls.is_empty() {
            return Err(WorkerError::ConfigInvalid("crawler step requires at least one start_urls entry".to_string()));
        }
        if self.max_depth == 0 {
            return Err(WorkerError::ConfigInvalid("max_depth must be at least 1".to_string()));
        }
        if self.max_pages == 0 {
            return Err(WorkerError::ConfigInvalid("max_pages must be at least 1".to_string()));
        }
        Ok(())
    }
}
