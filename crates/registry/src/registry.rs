// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps a `WorkerType` to its Definition and/or Job Worker implementation
//! (§4.G). A type may register one role, the other, or both.

use std::collections::HashMap;
use std::sync::Arc;

use qo_core::WorkerType;

use crate::worker::{DefinitionWorker, JobWorker};

#[derive(Default, Clone)]
struct WorkerEntry {
    definition: Option<Arc<dyn DefinitionWorker>>,
    job: Option<Arc<dyn JobWorker>>,
}

#[derive(Default, Clone)]
pub struct WorkerRegistry {
    workers: HashMap<WorkerType, WorkerEntry>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_definition(&mut self, worker: Arc<dyn DefinitionWorker>) {
        let entry = self.workers.entry(worker.get_type()).or_default();
        entry.definition = Some(worker);
    }

    pub fn register_job(&mut self, worker: Arc<dyn JobWorker>) {
        let entry = self.workers.entry(worker.get_worker_type()).or_default();
        entry.job = Some(worker);
    }

    pub fn definition(&self, worker_type: &WorkerType) -> Option<Arc<dyn DefinitionWorker>> {
        self.workers.get(worker_type).and_then(|e| e.definition.clone())
    }

    pub fn job(&self, worker_type: &WorkerType) -> Option<Arc<dyn JobWorker>> {
        self.workers.get(worker_type).and_then(|e| e.job.clone())
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
