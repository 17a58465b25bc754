// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Include/exclude glob filtering for discovered links (§4.J step 5).

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::config::CrawlConfig;

/// A link is allowed when it doesn't match any `exclude_patterns` entry and,
/// when `include_patterns` is non-empty, matches at least one of those.
pub fn is_allowed(url: &str, config: &CrawlConfig) -> bool {
    if let Some(exclude) = build(&config.exclude_patterns) {
        if exclude.is_match(url) {
            return false;
        }
    }
    match build(&config.include_patterns) {
        Some(include) => include.is_match(url),
        None => true,
    }
}

fn build(patterns: &[String]) -> Option<GlobSet> {
    if patterns.is_empty() {
        return None;
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        if let Ok(glob) = Glob::new(pattern) {
            builder.add(glob);
        }
    }
    builder.build().ok()
}
