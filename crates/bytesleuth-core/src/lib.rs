/// ByteSleuth Core — corruption analysis engine.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (CLI, HTTP, GUI).
///
/// # Modules
///
/// - [`scanner`] — `Analyzer` service, run lifecycle and the reference-tree walk.
/// - [`diff`] — Streaming byte-by-byte comparison of two files.
/// - [`store`] — Concurrent table of per-file outcomes.
/// - [`analysis`] — Statistics and report export derived from the store.
/// - [`model`] — Damage records, file statuses and formatting helpers.
/// - [`config`] — Matching, trailing-byte and offset policies.
pub mod analysis;
pub mod config;
pub mod diff;
pub mod error;
pub mod model;
pub mod scanner;
pub mod store;

pub use analysis::AnalysisStats;
pub use config::{AnalysisConfig, MatchPolicy, OffsetWidth, TrailingPolicy};
pub use error::{AnalysisError, AnalysisResult};
pub use model::{DamageKind, DamageRecord, FileStatus, Status};
pub use scanner::progress::{RunOutcome, RunSummary, ScanProgress};
pub use scanner::{Analyzer, RunHandle, RunState};
pub use store::ResultStore;
