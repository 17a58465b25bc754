// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only, newline-delimited JSON write-ahead log.
//!
//! Every storage component (Document Store, Job Store, Message Queue, KV
//! Store) persists through one `Wal` and rebuilds its `MaterializedState` by
//! replaying it on open. See [`crate::state::MaterializedState::apply_event`].

use qo_core::Event;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const FLUSH_THRESHOLD: u64 = 100;
const FLUSH_INTERVAL: Duration = Duration::from_secs(5);
const MAX_BACKUPS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum WalError {
    #[error("wal io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("wal serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// One committed log entry: a monotonically increasing sequence number
/// paired with the event it recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct WalEntry {
    pub seq: u64,
    pub event: Event,
}

#[derive(Serialize, Deserialize)]
struct WireEntry {
    seq: u64,
    event: Event,
}

/// A single log file plus the in-memory view of everything appended to it
/// this session (including entries recovered from disk on open).
pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    entries: Vec<WalEntry>,
    write_seq: u64,
    processed_seq: u64,
    read_cursor: usize,
    appended_since_flush: u64,
    last_flush: Instant,
}

impl Wal {
    /// Open (or create) the log at `path`, replaying any entries already on
    /// disk into memory. `processed_seq` is the checkpoint recovered from the
    /// last snapshot; entries with `seq <= processed_seq` are considered
    /// already reflected in that snapshot.
    ///
    /// If the file on disk contains anything that fails to parse as a log
    /// line (truncated write, torn append, non-UTF-8 garbage), everything
    /// from the first bad line onward is dropped: the bad file is rotated to
    /// a numbered `.bak` backup (keeping at most [`MAX_BACKUPS`]) and a fresh
    /// file containing only the valid prefix is written in its place.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let (entries, corrupt) = Self::recover(&path)?;
        if corrupt {
            Self::rotate_backups(&path)?;
            Self::rewrite_clean(&path, &entries)?;
        }
        let write_seq = entries.last().map(|e| e.seq).unwrap_or(0);
        let writer = BufWriter::new(OpenOptions::new().create(true).append(true).open(&path)?);
        Ok(Self {
            path,
            writer,
            entries,
            write_seq,
            processed_seq,
            read_cursor: 0,
            appended_since_flush: 0,
            last_flush: Instant::now(),
        })
    }

    /// Read `path` line by line, parsing each as a [`WireEntry`]. Stops at
    /// the first line that isn't valid UTF-8 or valid JSON; returns whether
    /// any such corruption was found.
    fn recover(path: &Path) -> Result<(Vec<WalEntry>, bool), WalError> {
        if !path.exists() {
            return Ok((Vec::new(), false));
        }
        let bytes = fs::read(path)?;
        let text = match std::str::from_utf8(&bytes) {
            Ok(t) => t,
            Err(_) => return Ok((Vec::new(), true)),
        };
        let mut entries = Vec::new();
        let mut corrupt = false;
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<WireEntry>(line) {
                Ok(wire) => entries.push(WalEntry { seq: wire.seq, event: wire.event }),
                Err(_) => {
                    corrupt = true;
                    break;
                }
            }
        }
        Ok((entries, corrupt))
    }

    fn rotate_backups(path: &Path) -> Result<(), WalError> {
        let bak3 = path.with_extension("bak.3");
        let bak2 = path.with_extension("bak.2");
        let bak1 = path.with_extension("bak");
        if bak3.exists() {
            fs::remove_file(&bak3)?;
        }
        if bak2.exists() {
            fs::rename(&bak2, &bak3)?;
        }
        if bak1.exists() {
            fs::rename(&bak1, &bak2)?;
        }
        if path.exists() {
            fs::rename(path, &bak1)?;
        }
        let _ = MAX_BACKUPS;
        Ok(())
    }

    fn rewrite_clean(path: &Path, entries: &[WalEntry]) -> Result<(), WalError> {
        let mut file = File::create(path)?;
        for entry in entries {
            Self::write_line(&mut file, entry)?;
        }
        file.flush()?;
        Ok(())
    }

    fn write_line(w: &mut impl Write, entry: &WalEntry) -> Result<(), WalError> {
        let line = serde_json::to_string(&WireEntry { seq: entry.seq, event: entry.event.clone() })?;
        w.write_all(line.as_bytes())?;
        w.write_all(b"\n")?;
        Ok(())
    }

    /// Append `event`, assigning it the next sequence number. Buffered until
    /// [`Wal::flush`]; visible immediately to [`Wal::next_unprocessed`] and
    /// [`Wal::entries_after`] regardless of flush state.
    pub fn append(&mut self, event: &Event) -> Result<u64, WalError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        Self::write_line(&mut self.writer, &entry)?;
        self.entries.push(entry);
        self.appended_since_flush += 1;
        Ok(self.write_seq)
    }

    /// Flush buffered writes to the OS. Does not `fsync`; callers needing
    /// durability across a power loss (not just a process crash) should pair
    /// this with a periodic snapshot.
    pub fn flush(&mut self) -> Result<(), WalError> {
        self.writer.flush()?;
        self.appended_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }

    /// Whether enough has been buffered (by count or by time) that callers
    /// should flush soon.
    pub fn needs_flush(&self) -> bool {
        self.appended_since_flush >= FLUSH_THRESHOLD || self.last_flush.elapsed() >= FLUSH_INTERVAL
    }

    /// Return the next entry past `processed_seq` that hasn't been returned
    /// by a previous call, advancing the read cursor. Returns `None` once
    /// every in-memory entry has been consumed.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, WalError> {
        while self.read_cursor < self.entries.len() {
            let entry = self.entries[self.read_cursor].clone();
            self.read_cursor += 1;
            if entry.seq > self.processed_seq {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }

    /// Mark `seq` as reflected in the caller's materialized state. Monotonic:
    /// a lower `seq` than the current checkpoint is ignored.
    pub fn mark_processed(&mut self, seq: u64) {
        if seq > self.processed_seq {
            self.processed_seq = seq;
        }
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    /// All in-memory entries with `seq` strictly greater than `after`.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, WalError> {
        Ok(self.entries.iter().filter(|e| e.seq > after).cloned().collect())
    }

    /// Compact the log, discarding entries with `seq < keep_from` (used
    /// after a snapshot makes them redundant). Rewrites the file on disk.
    pub fn truncate_before(&mut self, keep_from: u64) -> Result<(), WalError> {
        self.entries.retain(|e| e.seq >= keep_from);
        self.read_cursor = self.read_cursor.min(self.entries.len());
        Self::rewrite_clean(&self.path, &self.entries)?;
        self.writer = BufWriter::new(OpenOptions::new().create(true).append(true).open(&self.path)?);
        self.appended_since_flush = 0;
        self.last_flush = Instant::now();
        Ok(())
    }
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
