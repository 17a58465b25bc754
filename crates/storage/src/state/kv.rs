// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Key/Value Store event handlers (§4.B): opaque string-to-blob storage used
//! for credential placeholder resolution and binary artifact keys.

use qo_core::Event;

use super::MaterializedState;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::KvSet { key, value } => {
            state.kv.insert(key.clone(), value.clone());
        }
        Event::KvDeleted { key } => {
            state.kv.remove(key);
        }
        _ => {}
    }
}
