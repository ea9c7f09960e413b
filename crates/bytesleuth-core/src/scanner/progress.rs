/// Run progress reporting — lightweight messages sent from the run thread
/// to whoever holds the `RunHandle`, plus the terminal outcome types.
use crate::analysis::AnalysisStats;
use crate::error::AnalysisError;
use crate::model::Status;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Progress updates sent from the run thread.
///
/// The actual results live in the shared `ResultStore`; these messages
/// carry only counters and status flags. Delivery is best-effort: when the
/// channel is full, messages are dropped rather than stalling the run.
#[derive(Debug, Clone)]
pub enum ScanProgress {
    /// The walk has begun.
    Started {
        reference: PathBuf,
        candidate: PathBuf,
    },
    /// One file has been classified.
    FileDone { file_name: String, status: Status },
    /// Periodic running totals.
    Update {
        files_done: u64,
        current_path: String,
    },
    /// A non-fatal error (unreadable directory or file).
    Error { path: String, message: String },
    /// The walk finished. Final numbers are in the `RunOutcome`.
    Complete { duration: Duration, files_done: u64 },
    /// The run aborted before walking.
    Failed { message: String },
}

/// Final numbers for a run that walked the whole reference tree.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub stats: AnalysisStats,
    /// Regular files visited under the reference root.
    pub files_compared: u64,
    /// Directories or entries the walker could not read.
    pub traversal_errors: u64,
    /// Files whose key overwrote an earlier entry in the same run.
    pub collisions: u64,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    #[serde(with = "duration_ms")]
    pub duration: Duration,
}

/// Terminal outcome of a run, delivered exactly once per `RunHandle`.
#[derive(Debug)]
pub enum RunOutcome {
    Completed(RunSummary),
    Failed(AnalysisError),
}

impl RunOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// The summary, if the run completed.
    pub fn summary(&self) -> Option<&RunSummary> {
        match self {
            Self::Completed(s) => Some(s),
            Self::Failed(_) => None,
        }
    }

    /// Convert into a `Result` for `?`-style handling.
    pub fn into_result(self) -> Result<RunSummary, AnalysisError> {
        match self {
            Self::Completed(s) => Ok(s),
            Self::Failed(e) => Err(e),
        }
    }
}

mod duration_ms {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }
}
