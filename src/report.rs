use bytesleuth_core::analysis::{damage_ranges, most_damaged, Report};
use bytesleuth_core::model::format::{format_byte, format_count, format_offset, format_size};
use bytesleuth_core::{Analyzer, RunSummary, Status};
use serde_json::json;
use std::io::{self, Write};

/// Ranges shown per file with `--details`.
const MAX_RANGES_SHOWN: usize = 20;

pub fn collect(analyzer: &Analyzer) -> Report {
    Report {
        running: analyzer.is_running(),
        stats: analyzer.stats(),
        files: analyzer.statuses(),
    }
}

pub fn json(report: &Report, summary: &RunSummary) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&json!({
        "summary": summary,
        "report": report,
    }))
}

pub fn print_text<W: Write>(
    out: &mut W,
    analyzer: &Analyzer,
    report: &Report,
    summary: &RunSummary,
    details: bool,
    top: usize,
) -> io::Result<()> {
    let s = &report.stats;
    writeln!(
        out,
        "Analysed {} files in {:.2?}",
        format_count(s.total_files),
        summary.duration
    )?;
    writeln!(
        out,
        "  ok {}  damaged {}  missing {}  error {}  ({} damaged bytes)",
        format_count(s.ok_files),
        format_count(s.damaged_files),
        format_count(s.missing_files),
        format_count(s.error_files),
        format_count(s.total_damaged_bytes)
    )?;
    if summary.traversal_errors > 0 {
        writeln!(out, "  {} unreadable directories", summary.traversal_errors)?;
    }
    if summary.collisions > 0 {
        writeln!(
            out,
            "  {} name collisions (try --match-by relative-path)",
            summary.collisions
        )?;
    }
    writeln!(out)?;

    for st in report.files.iter().filter(|st| st.status != Status::Ok) {
        write!(out, "{:<8} {}", st.status, st.file_name)?;
        if let Some(n) = st.damage_count {
            write!(out, "  ({} bytes)", format_count(n as u64))?;
        }
        if let Some(lm) = st.length_mismatch {
            write!(
                out,
                "  [length {} vs {}]",
                format_size(lm.reference_len),
                format_size(lm.candidate_len)
            )?;
        }
        if let Some(err) = &st.error {
            write!(out, "  {err}")?;
        }
        writeln!(out)?;

        if details && st.status == Status::Damaged {
            let ranges = damage_ranges(&st.damages);
            for r in ranges.iter().take(MAX_RANGES_SHOWN) {
                writeln!(
                    out,
                    "           {} +{} {:?}",
                    format_offset(r.start),
                    r.len,
                    r.kind
                )?;
            }
            if ranges.len() > MAX_RANGES_SHOWN {
                writeln!(out, "           ... {} more ranges", ranges.len() - MAX_RANGES_SHOWN)?;
            }
            if let Some(first) = st.damages.first() {
                writeln!(
                    out,
                    "           first: {} -> {}",
                    format_byte(first.original_byte),
                    format_byte(first.damaged_byte)
                )?;
            }
        }
    }

    if top > 0 {
        writeln!(out)?;
        writeln!(out, "Most damaged:")?;
        for st in most_damaged(analyzer.store(), top) {
            writeln!(out, "  {:>10}  {}", format_count(st.damages.len() as u64), st.file_name)?;
        }
    }
    Ok(())
}
