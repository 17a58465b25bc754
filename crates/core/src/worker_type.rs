// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker type identifier.
//!
//! A `WorkerType` selects the registered [`DefinitionWorker`]/[`JobWorker`]
//! pair for a [`JobStep`](crate::job_definition::JobStep) or
//! [`QueueJob`](crate::queue_job::QueueJob). It is a small string newtype
//! (backed by `smol_str::SmolStr` so cloning a step's worker type is free)
//! rather than an enum, because the registry is open — new worker types are
//! added without touching this crate.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::borrow::Borrow;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerType(SmolStr);

impl WorkerType {
    pub fn new(s: impl AsRef<str>) -> Self {
        Self(SmolStr::new(s.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WorkerType {
    fn from(s: String) -> Self {
        Self(SmolStr::new(s))
    }
}

impl From<&str> for WorkerType {
    fn from(s: &str) -> Self {
        Self(SmolStr::new(s))
    }
}

impl PartialEq<str> for WorkerType {
    fn eq(&self, other: &str) -> bool {
        self.0.as_str() == other
    }
}

impl PartialEq<&str> for WorkerType {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_str() == *other
    }
}

impl Borrow<str> for WorkerType {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_input() {
        let wt = WorkerType::new("crawler_url");
        assert_eq!(wt.to_string(), "crawler_url");
    }

    #[test]
    fn equality_across_construction_paths() {
        assert_eq!(WorkerType::new("fundamentals"), WorkerType::from("fundamentals".to_string()));
    }

    #[test]
    fn hash_map_lookup_by_borrowed_str() {
        use std::collections::HashMap;
        let mut map: HashMap<WorkerType, u32> = HashMap::new();
        map.insert(WorkerType::new("crawler_url"), 1);
        assert_eq!(map.get("crawler_url"), Some(&1));
    }
}
