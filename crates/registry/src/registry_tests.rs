// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{FakeDefinitionWorker, FakeJobWorker};
use std::sync::Arc;

#[test]
fn registers_definition_and_job_workers_independently() {
    let mut registry = WorkerRegistry::new();
    registry.register_definition(Arc::new(FakeDefinitionWorker::new("crawler_seed")));
    registry.register_job(Arc::new(FakeJobWorker::new("crawler_url")));

    assert!(registry.definition(&"crawler_seed".into()).is_some());
    assert!(registry.job(&"crawler_seed".into()).is_none());
    assert!(registry.job(&"crawler_url".into()).is_some());
    assert!(registry.definition(&"crawler_url".into()).is_none());
}

#[test]
fn a_type_may_register_both_roles() {
    let mut registry = WorkerRegistry::new();
    let worker_type: WorkerType = "crawler".into();
    registry.register_definition(Arc::new(FakeDefinitionWorker::new(worker_type.as_str())));
    registry.register_job(Arc::new(FakeJobWorker::new(worker_type.as_str())));

    assert!(registry.definition(&worker_type).is_some());
    assert!(registry.job(&worker_type).is_some());
}

#[test]
fn unknown_worker_type_resolves_to_none() {
    let registry = WorkerRegistry::new();
    assert!(registry.definition(&"nonexistent".into()).is_none());
    assert!(registry.job(&"nonexistent".into()).is_none());
}
