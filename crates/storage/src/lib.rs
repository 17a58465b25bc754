// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage for job orchestration: an append-only WAL, the
//! materialized state it replays into, and the [`Store`] handle that fronts
//! both for the Document Store, KV Store, Job Manager, and Message Queue.

pub mod migration;
pub mod state;
pub mod store;
pub mod wal;

pub use migration::{Migration, MigrationError, MigrationRegistry, CURRENT_SNAPSHOT_VERSION};
pub use state::{MaterializedState, QueueItem, QueueItemStatus};
pub use store::{Store, StorageError};
pub use wal::{Wal, WalEntry, WalError};
