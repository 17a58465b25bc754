// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Definition: the declarative, immutable-once-submitted pipeline a run
//! executes (§3, §4.H).

use crate::worker_type::WorkerType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

crate::define_id! {
    /// Unique identifier for a Job Definition.
    pub struct JobDefinitionId("jdf-");
}

/// What the Step Orchestrator does when a step fails (§4.H step 2.f).
///
/// Not part of the distilled data model's field list, but named explicitly
/// by the orchestrator algorithm; modeled as a typed enum on the definition
/// rather than a stringly-typed `config` entry so the orchestrator's match
/// is exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run; mark the root job failed.
    #[default]
    Stop,
    /// Proceed to the next step; the root is failed only if any step failed.
    Continue,
}

/// One step of a Job Definition. `worker_type` selects the registered
/// Definition/Job Worker pair; `config` is opaque to the core and validated
/// by that worker's `ValidateConfig`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStep {
    pub name: String,
    #[serde(rename = "type")]
    pub worker_type: WorkerType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
}

impl JobStep {
    pub fn new(name: impl Into<String>, worker_type: impl Into<WorkerType>) -> Self {
        Self {
            name: name.into(),
            worker_type: worker_type.into(),
            description: None,
            config: HashMap::new(),
        }
    }

    crate::setters! {
        into { description: String }
        set { config: HashMap<String, serde_json::Value> }
    }
}

/// A declarative pipeline, immutable once submitted for a run (§3).
///
/// Mutating a submitted definition is modeled by producing a new
/// `JobDefinition` with `delete_history = true`, which tells the Document
/// Store and cache layers to invalidate entries keyed on the old definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub id: JobDefinitionId,
    pub name: String,
    pub source_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_id: Option<String>,
    pub steps: Vec<JobStep>,
    /// Free-form run configuration, including an optional `variables[]` list
    /// consumed by fan-out-aware Definition Workers (§4.H "Fan-out").
    #[serde(default)]
    pub config: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub failure_policy: FailurePolicy,
    #[serde(default)]
    pub delete_history: bool,
}

impl JobDefinition {
    pub fn new(name: impl Into<String>, source_type: impl Into<String>, steps: Vec<JobStep>) -> Self {
        Self {
            id: JobDefinitionId::new(),
            name: name.into(),
            source_type: source_type.into(),
            base_url: None,
            auth_id: None,
            steps,
            config: HashMap::new(),
            tags: Vec::new(),
            failure_policy: FailurePolicy::default(),
            delete_history: false,
        }
    }

    /// The `variables[]` fan-out list from `config`, if present.
    pub fn variables(&self) -> Option<&[serde_json::Value]> {
        self.config.get("variables").and_then(|v| v.as_array()).map(Vec::as_slice)
    }

    crate::setters! {
        into { base_url: String, auth_id: String }
        set { config: HashMap<String, serde_json::Value>, tags: Vec<String>, failure_policy: FailurePolicy }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_definition_defaults_to_stop_policy_not_deleted() {
        let def = JobDefinition::new("fundamentals", "equities", vec![JobStep::new("fetch", "fundamentals_ingest")]);
        assert_eq!(def.failure_policy, FailurePolicy::Stop);
        assert!(!def.delete_history);
        assert_eq!(def.steps.len(), 1);
    }

    #[test]
    fn variables_reads_fan_out_list_from_config() {
        let mut def = JobDefinition::new("tickers", "equities", vec![]);
        def.config.insert("variables".into(), serde_json::json!(["AAPL", "MSFT"]));
        let vars = def.variables().unwrap();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars[0], "AAPL");
    }

    #[test]
    fn variables_is_none_when_absent() {
        let def = JobDefinition::new("tickers", "equities", vec![]);
        assert!(def.variables().is_none());
    }

    #[test]
    fn step_type_serializes_as_type_field() {
        let step = JobStep::new("crawl", "crawler_url");
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["type"], "crawler_url");
        assert!(json.get("worker_type").is_none());
    }

    #[test]
    fn failure_policy_serde_roundtrip() {
        for policy in [FailurePolicy::Stop, FailurePolicy::Continue] {
            let json = serde_json::to_string(&policy).unwrap();
            let parsed: FailurePolicy = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, policy);
        }
    }
}
