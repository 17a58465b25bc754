// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::unwrap_used))]

//! qo-crawler: the reference `ReturnsChildJobs=true` worker (§4.J). Depends
//! only on `qo-core` and `qo-registry`'s trait surfaces, never on
//! `qo-storage` or `qo-engine`.

pub mod config;
pub mod extract;
pub mod filter;
pub mod worker;

pub use config::CrawlConfig;
pub use worker::{CrawlerWorker, CRAWLER_WORKER_TYPE};
