/// Per-file outcome of an analysis run.
///
/// The damage list is shared (`Arc<[DamageRecord]>`) so snapshots taken by
/// readers while a run is in flight clone a pointer, not the records.
use super::damage::DamageRecord;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Classification of a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    /// Byte-for-byte identical over the compared length.
    Ok,
    /// At least one damage record.
    Damaged,
    /// No candidate counterpart exists.
    Missing,
    /// Opening or reading either side failed.
    Error,
}

impl Status {
    /// Upper-case label, as shown in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Damaged => "DAMAGED",
            Self::Missing => "MISSING",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.label())
    }
}

/// Lengths of the two files when they differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthMismatch {
    pub reference_len: u64,
    pub candidate_len: u64,
}

/// Outcome for one file key.
///
/// The status-specific constructors keep the damage list non-empty exactly
/// when the status is `Damaged`, with `damage_count` matching its length.
/// Fields are public for reading; a value assembled by hand or deserialized
/// from a report is not checked, see [`FileStatus::is_consistent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatus {
    /// Match key (base name or relative path, depending on `MatchPolicy`).
    pub file_name: CompactString,
    pub status: Status,
    /// `Some(damages.len())` for `Damaged`, `None` otherwise.
    pub damage_count: Option<usize>,
    pub damages: Arc<[DamageRecord]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length_mismatch: Option<LengthMismatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileStatus {
    fn bare(file_name: CompactString, status: Status) -> Self {
        Self {
            file_name,
            status,
            damage_count: None,
            damages: Arc::from(Vec::new()),
            length_mismatch: None,
            error: None,
        }
    }

    /// Build an `Ok` or `Damaged` status from the diff result.
    pub fn compared(
        file_name: CompactString,
        damages: Vec<DamageRecord>,
        length_mismatch: Option<LengthMismatch>,
    ) -> Self {
        let mut status = if damages.is_empty() {
            Self::bare(file_name, Status::Ok)
        } else {
            let count = damages.len();
            Self {
                damage_count: Some(count),
                damages: Arc::from(damages),
                ..Self::bare(file_name, Status::Damaged)
            }
        };
        status.length_mismatch = length_mismatch;
        status
    }

    /// The candidate counterpart does not exist.
    pub fn missing(file_name: CompactString) -> Self {
        Self::bare(file_name, Status::Missing)
    }

    /// Comparing the pair failed.
    pub fn error(file_name: CompactString, message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::bare(file_name, Status::Error)
        }
    }

    /// Whether the damage list and count agree with the status.
    pub fn is_consistent(&self) -> bool {
        if self.status == Status::Damaged {
            !self.damages.is_empty() && self.damage_count == Some(self.damages.len())
        } else {
            self.damages.is_empty() && self.damage_count.is_none()
        }
    }

    /// Number of damage records (0 unless `Damaged`).
    #[inline]
    pub fn damage_len(&self) -> usize {
        self.damages.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compared_without_damage_is_ok() {
        let st = FileStatus::compared("a.bin".into(), Vec::new(), None);
        assert_eq!(st.status, Status::Ok);
        assert_eq!(st.damage_count, None);
        assert!(st.damages.is_empty());
    }

    #[test]
    fn compared_with_damage_sets_count() {
        let st = FileStatus::compared(
            "a.bin".into(),
            vec![DamageRecord::mismatch(1, 66, 90), DamageRecord::mismatch(4, 0, 1)],
            None,
        );
        assert_eq!(st.status, Status::Damaged);
        assert_eq!(st.damage_count, Some(2));
        assert_eq!(st.damage_len(), 2);
    }

    #[test]
    fn missing_and_error_carry_no_damage() {
        let m = FileStatus::missing("m".into());
        assert_eq!(m.status, Status::Missing);
        assert!(m.damages.is_empty() && m.damage_count.is_none());

        let e = FileStatus::error("e".into(), "permission denied");
        assert_eq!(e.status, Status::Error);
        assert!(e.damages.is_empty() && e.damage_count.is_none());
        assert_eq!(e.error.as_deref(), Some("permission denied"));
    }

    #[test]
    fn constructors_are_consistent_and_edits_are_detected() {
        let damaged = FileStatus::compared(
            "a.bin".into(),
            vec![DamageRecord::mismatch(0, 1, 2)],
            None,
        );
        assert!(damaged.is_consistent());
        assert!(FileStatus::compared("b".into(), Vec::new(), None).is_consistent());
        assert!(FileStatus::missing("c".into()).is_consistent());
        assert!(FileStatus::error("d".into(), "boom").is_consistent());

        let mut tampered = damaged.clone();
        tampered.status = Status::Ok;
        assert!(!tampered.is_consistent());

        let json = r#"{"fileName":"x","status":"DAMAGED","damageCount":null,"damages":[]}"#;
        let parsed: FileStatus = serde_json::from_str(json).unwrap();
        assert!(!parsed.is_consistent());
    }

    #[test]
    fn status_serialises_upper_case() {
        assert_eq!(serde_json::to_string(&Status::Damaged).unwrap(), "\"DAMAGED\"");
        assert_eq!(Status::Missing.to_string(), "MISSING");
    }
}
