/// Result store — the shared, concurrently-readable table of per-file
/// outcomes for the most recent run.
///
/// One writer (the walker, or the comparison pool) inserts entries while
/// any number of readers query it. Each insert takes the write lock once,
/// so readers never observe a half-written `FileStatus`. Damage lists are
/// `Arc<[DamageRecord]>`, which keeps snapshots cheap.
use crate::model::{DamageRecord, FileStatus, Status};
use compact_str::CompactString;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Shared handle to a result store.
pub type SharedStore = Arc<ResultStore>;

#[derive(Debug, Default)]
pub struct ResultStore {
    entries: RwLock<HashMap<CompactString, FileStatus>>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every entry. Called once at the start of each run.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Insert or overwrite the entry for `status.file_name`.
    ///
    /// Returns the previous entry when the key was already present
    /// (a base-name collision).
    pub fn insert(&self, status: FileStatus) -> Option<FileStatus> {
        let key = status.file_name.clone();
        self.entries.write().insert(key, status)
    }

    /// Look up one entry.
    pub fn get(&self, file_name: &str) -> Option<FileStatus> {
        self.entries.read().get(file_name).cloned()
    }

    /// All entries, sorted by key, each carrying its damage list.
    pub fn get_all(&self) -> Vec<FileStatus> {
        let mut all: Vec<FileStatus> = self.entries.read().values().cloned().collect();
        all.sort_unstable_by(|a, b| a.file_name.cmp(&b.file_name));
        all
    }

    /// Damage records for `file_name`; empty if unknown or not `Damaged`.
    pub fn get_damages(&self, file_name: &str) -> Arc<[DamageRecord]> {
        match self.entries.read().get(file_name) {
            Some(st) if st.status == Status::Damaged => Arc::clone(&st.damages),
            _ => Arc::from(Vec::new()),
        }
    }

    /// Run `f` over the current entries under a single read lock.
    ///
    /// Everything `f` sees belongs to one consistent point in time.
    pub fn with_entries<R>(
        &self,
        f: impl FnOnce(&HashMap<CompactString, FileStatus>) -> R,
    ) -> R {
        f(&self.entries.read())
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
