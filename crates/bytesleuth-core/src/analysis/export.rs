/// Report export — CSV tables and a JSON document of a run's results.
use crate::analysis::stats::AnalysisStats;
use crate::model::{DamageKind, DamageRecord, FileStatus};
use serde::Serialize;
use std::io::Write;

/// Everything a caller needs to render a finished (or in-progress) run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub running: bool,
    pub stats: AnalysisStats,
    pub files: Vec<FileStatus>,
}

#[derive(Serialize)]
struct StatusRow<'a> {
    file_name: &'a str,
    status: &'static str,
    damage_count: Option<usize>,
    reference_len: Option<u64>,
    candidate_len: Option<u64>,
    error: Option<&'a str>,
}

#[derive(Serialize)]
struct DamageRow {
    offset: i64,
    original_byte: u8,
    damaged_byte: u8,
    kind: DamageKind,
}

/// Write one CSV row per file.
pub fn write_csv<W: Write>(statuses: &[FileStatus], writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for st in statuses {
        wtr.serialize(StatusRow {
            file_name: st.file_name.as_str(),
            status: st.status.label(),
            damage_count: st.damage_count,
            reference_len: st.length_mismatch.map(|m| m.reference_len),
            candidate_len: st.length_mismatch.map(|m| m.candidate_len),
            error: st.error.as_deref(),
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write one CSV row per damage record.
pub fn write_damages_csv<W: Write>(records: &[DamageRecord], writer: W) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for rec in records {
        wtr.serialize(DamageRow {
            offset: rec.offset,
            original_byte: rec.original_byte,
            damaged_byte: rec.damaged_byte,
            kind: rec.kind,
        })?;
    }
    wtr.flush()?;
    Ok(())
}

/// Pretty-printed JSON for a report.
pub fn to_json(report: &Report) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LengthMismatch;

    #[test]
    fn status_csv_has_header_and_rows() {
        let statuses = vec![
            FileStatus::compared(
                "a.bin".into(),
                vec![DamageRecord::mismatch(1, 66, 90)],
                Some(LengthMismatch {
                    reference_len: 3,
                    candidate_len: 4,
                }),
            ),
            FileStatus::missing("b.bin".into()),
        ];
        let mut out = Vec::new();
        write_csv(&statuses, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "file_name,status,damage_count,reference_len,candidate_len,error"
        );
        assert_eq!(lines[1], "a.bin,DAMAGED,1,3,4,");
        assert_eq!(lines[2], "b.bin,MISSING,,,,");
    }

    #[test]
    fn damage_csv_lists_records() {
        let mut out = Vec::new();
        write_damages_csv(&[DamageRecord::mismatch(1, 66, 90)], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "offset,original_byte,damaged_byte,kind\n1,66,90,MISMATCH\n"
        );
    }

    #[test]
    fn damage_csv_labels_length_records() {
        let records = [DamageRecord::truncated(3, 7), DamageRecord::extended(4, 9)];
        let mut out = Vec::new();
        write_damages_csv(&records, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[1], "3,7,0,TRUNCATED");
        assert_eq!(lines[2], "4,0,9,EXTENDED");
    }

    #[test]
    fn json_report_embeds_damages() {
        let report = Report {
            running: false,
            stats: AnalysisStats::default(),
            files: vec![FileStatus::compared(
                "a.bin".into(),
                vec![DamageRecord::mismatch(1, 66, 90)],
                None,
            )],
        };
        let json = to_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["files"][0]["status"], "DAMAGED");
        assert_eq!(value["files"][0]["damageCount"], 1);
        assert_eq!(value["files"][0]["damages"][0]["damagedByte"], 90);
        assert_eq!(value["running"], false);
    }
}
