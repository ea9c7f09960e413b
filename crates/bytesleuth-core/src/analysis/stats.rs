/// Summary statistics derived from the result store.
///
/// Nothing here is cached: every call scans the store under one read lock,
/// so the numbers always describe a single point in time, even mid-run.
use crate::model::{DamageKind, DamageRecord, FileStatus, Status};
use crate::store::ResultStore;
use serde::{Deserialize, Serialize};

/// Counts of files by status.
///
/// `ok_files + damaged_files + missing_files + error_files == total_files`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStats {
    pub total_files: u64,
    pub ok_files: u64,
    pub damaged_files: u64,
    pub missing_files: u64,
    pub error_files: u64,
    /// Sum of damage records over all damaged files.
    pub total_damaged_bytes: u64,
}

impl AnalysisStats {
    /// Fold one entry into the running totals.
    pub fn record(&mut self, st: &FileStatus) {
        self.total_files += 1;
        match st.status {
            Status::Ok => self.ok_files += 1,
            Status::Damaged => {
                self.damaged_files += 1;
                self.total_damaged_bytes += st.damages.len() as u64;
            }
            Status::Missing => self.missing_files += 1,
            Status::Error => self.error_files += 1,
        }
    }

    /// `true` if every file compared clean.
    pub fn is_clean(&self) -> bool {
        self.total_files == self.ok_files
    }
}

/// Compute stats from the current contents of `store`.
pub fn compute_stats(store: &ResultStore) -> AnalysisStats {
    store.with_entries(|entries| {
        let mut stats = AnalysisStats::default();
        for st in entries.values() {
            stats.record(st);
        }
        stats
    })
}

/// The `n` files with the most damage records, most damaged first.
/// Ties are broken by name so the order is stable.
pub fn most_damaged(store: &ResultStore, n: usize) -> Vec<FileStatus> {
    if n == 0 {
        return Vec::new();
    }
    let mut damaged: Vec<FileStatus> = store.with_entries(|entries| {
        entries
            .values()
            .filter(|st| st.status == Status::Damaged)
            .cloned()
            .collect()
    });

    damaged.sort_unstable_by(|a, b| {
        b.damages
            .len()
            .cmp(&a.damages.len())
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    damaged.truncate(n);
    damaged
}

/// A contiguous run of damaged offsets of the same kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageRange {
    pub start: i64,
    /// Number of consecutive damaged bytes.
    pub len: u64,
    pub kind: DamageKind,
}

/// Coalesce records into ranges of consecutive offsets.
///
/// Expects records in increasing offset order, as produced by the diff
/// engine.
pub fn damage_ranges(records: &[DamageRecord]) -> Vec<DamageRange> {
    let mut ranges: Vec<DamageRange> = Vec::new();
    for rec in records {
        match ranges.last_mut() {
            Some(last)
                if last.kind == rec.kind
                    && last.start.wrapping_add(last.len as i64) == rec.offset =>
            {
                last.len += 1;
            }
            _ => ranges.push(DamageRange {
                start: rec.offset,
                len: 1,
                kind: rec.kind,
            }),
        }
    }
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn damaged(name: &str, n: usize) -> FileStatus {
        let recs = (0..n)
            .map(|i| DamageRecord::mismatch(i as i64 * 2, 1, 2))
            .collect();
        FileStatus::compared(name.into(), recs, None)
    }

    fn populated() -> ResultStore {
        let store = ResultStore::new();
        store.insert(FileStatus::compared("ok1".into(), Vec::new(), None));
        store.insert(FileStatus::compared("ok2".into(), Vec::new(), None));
        store.insert(damaged("d1", 3));
        store.insert(damaged("d2", 5));
        store.insert(FileStatus::missing("m1".into()));
        store.insert(FileStatus::error("e1".into(), "unreadable"));
        store
    }

    #[test]
    fn counts_sum_to_total_including_errors() {
        let stats = compute_stats(&populated());
        assert_eq!(stats.total_files, 6);
        assert_eq!(stats.ok_files, 2);
        assert_eq!(stats.damaged_files, 2);
        assert_eq!(stats.missing_files, 1);
        assert_eq!(stats.error_files, 1);
        assert_eq!(
            stats.ok_files + stats.damaged_files + stats.missing_files + stats.error_files,
            stats.total_files
        );
        assert_eq!(stats.total_damaged_bytes, 8);
        assert!(!stats.is_clean());
    }

    #[test]
    fn empty_store_is_all_zero() {
        let stats = compute_stats(&ResultStore::new());
        assert_eq!(stats, AnalysisStats::default());
        assert!(stats.is_clean());
    }

    #[test]
    fn most_damaged_orders_by_count() {
        let top = most_damaged(&populated(), 5);
        let names: Vec<&str> = top.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(names, vec!["d2", "d1"]);
        assert!(most_damaged(&populated(), 0).is_empty());
        assert_eq!(most_damaged(&populated(), 1).len(), 1);
    }

    #[test]
    fn ranges_coalesce_consecutive_offsets() {
        let recs = vec![
            DamageRecord::mismatch(4, 0, 1),
            DamageRecord::mismatch(5, 0, 1),
            DamageRecord::mismatch(6, 0, 1),
            DamageRecord::mismatch(10, 0, 1),
            DamageRecord::truncated(11, 7),
            DamageRecord::truncated(12, 7),
        ];
        let ranges = damage_ranges(&recs);
        assert_eq!(
            ranges,
            vec![
                DamageRange {
                    start: 4,
                    len: 3,
                    kind: DamageKind::Mismatch,
                },
                DamageRange {
                    start: 10,
                    len: 1,
                    kind: DamageKind::Mismatch,
                },
                DamageRange {
                    start: 11,
                    len: 2,
                    kind: DamageKind::Truncated,
                },
            ]
        );
        assert!(damage_ranges(&[]).is_empty());
    }
}
