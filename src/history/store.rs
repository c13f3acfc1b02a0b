use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use tracing::warn;

use crate::history::model::HistoryEntry;
use crate::{CarbonpostError, Result};

/// Retention bound used when none is configured.
pub const DEFAULT_CAPACITY: usize = 50;

/// Bounded, append-only history of past measurements.
///
/// A single mutex guards an in-memory window of the most recent entries;
/// append and FIFO trim happen inside one critical section, so readers
/// never observe more than `capacity` entries or a torn list. When a flush
/// path is configured, the retained window is rewritten to a JSON-lines
/// file on every append under an exclusive file lock.
///
/// History is diagnostic data: `append` never fails its caller. Flush
/// errors are logged and swallowed.
pub struct HistoryStore {
    capacity: usize,
    entries: Mutex<VecDeque<HistoryEntry>>,
    flush_path: Option<PathBuf>,
}

impl HistoryStore {
    /// In-memory store with the given retention bound.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Mutex::new(VecDeque::with_capacity(capacity.max(1))),
            flush_path: None,
        }
    }

    /// Store that also flushes its window to `path` on every append.
    pub fn with_flush_path(capacity: usize, path: PathBuf) -> Self {
        Self {
            flush_path: Some(path),
            ..Self::new(capacity)
        }
    }

    /// Restore the retained window from `path`, then keep flushing to it.
    /// A missing or unreadable file starts the store empty.
    pub fn load(capacity: usize, path: PathBuf) -> Self {
        let store = Self::with_flush_path(capacity, path.clone());
        match read_entries(&path) {
            Ok(mut restored) => {
                let skip = restored.len().saturating_sub(store.capacity);
                let mut entries = store.entries.lock().expect("history lock poisoned");
                entries.extend(restored.drain(skip..));
            }
            Err(e) => {
                if path.exists() {
                    warn!(path = %path.display(), error = %e, "could not restore history");
                }
            }
        }
        store
    }

    /// Append an entry, trimming to the retention bound.
    ///
    /// Best-effort: a failed flush is logged, never surfaced.
    pub fn append(&self, entry: HistoryEntry) {
        let mut entries = self.entries.lock().expect("history lock poisoned");
        entries.push_back(entry);
        while entries.len() > self.capacity {
            entries.pop_front();
        }

        if let Some(path) = &self.flush_path {
            // Flushed under the same lock so the file always holds a
            // consistent window.
            if let Err(e) = flush_entries(path, entries.make_contiguous()) {
                warn!(path = %path.display(), error = %e, "failed to flush history");
            }
        }
    }

    /// Up to `limit` entries, most recent first.
    pub fn list(&self, limit: usize) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().expect("history lock poisoned");
        entries.iter().rev().take(limit).cloned().collect()
    }

    /// Every retained entry, oldest first. Input for aggregation.
    pub fn snapshot(&self) -> Vec<HistoryEntry> {
        let entries = self.entries.lock().expect("history lock poisoned");
        entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().expect("history lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

fn read_entries(path: &Path) -> Result<Vec<HistoryEntry>> {
    let file = fs::File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(file);
    let mut entries = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(entry) = serde_json::from_str::<HistoryEntry>(&line) {
            entries.push(entry);
        }
    }
    // Unlock on drop
    Ok(entries)
}

fn flush_entries(path: &Path, entries: &[HistoryEntry]) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .read(true)
        .write(true)
        .open(path)?;

    file.lock_exclusive()?;
    file.set_len(0)?;
    file.seek(std::io::SeekFrom::Start(0))?;

    let mut writer = std::io::BufWriter::new(file);
    for entry in entries {
        let json = serde_json::to_string(entry).map_err(CarbonpostError::Json)?;
        writeln!(writer, "{}", json)?;
    }
    writer.flush()?;

    Ok(())
}
