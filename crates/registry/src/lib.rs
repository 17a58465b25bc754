// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]

//! qo-registry: the Worker Registry (§4.G) and the narrow trait surfaces a
//! worker implementation depends on. `qo-engine` and worker crates
//! (`qo-crawler`) depend only on these traits, never on each other or on
//! `qo-storage` directly.

pub mod collab;
pub mod context;
pub mod error;
pub mod registry;
pub mod worker;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use collab::{CredentialError, CredentialResolver, RenderError, RenderedPage, Renderer};
pub use context::WorkerContext;
pub use error::WorkerError;
pub use registry::WorkerRegistry;
pub use worker::{DefinitionWorker, JobWorker};
