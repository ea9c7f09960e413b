/// Scanner module — orchestrates analysis runs.
///
/// An [`Analyzer`] owns the result store and the run state. Callers set the
/// two roots, call [`Analyzer::start`] and get a [`RunHandle`] back at once;
/// the walk runs on a background thread and writes into the shared
/// [`ResultStore`] as it goes, so status queries work mid-run.
///
/// Only one run may be in flight per analyzer. Exclusivity is a
/// compare-and-swap on the atomic [`RunState`]: two racing `start` calls
/// can never both launch.
pub mod progress;
pub mod walk;

use crate::analysis::{compute_stats, AnalysisStats};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AnalysisResult};
use crate::model::{DamageRecord, FileStatus};
use crate::store::{ResultStore, SharedStore};
use progress::{RunOutcome, ScanProgress};

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, info};

/// Maximum number of progress messages that may queue up in the channel.
///
/// Messages past this are dropped, never blocking the run.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// The two directory trees being compared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootPaths {
    /// Authoritative tree.
    pub reference: PathBuf,
    /// Tree checked for corruption.
    pub candidate: PathBuf,
}

/// Lifecycle of the analyzer's most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    /// No run has been started yet.
    Idle = 0,
    Running = 1,
    /// The last run walked the whole reference tree.
    Completed = 2,
    /// The last run aborted (missing root, worker failure or panic).
    Failed = 3,
}

impl RunState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Running,
            2 => Self::Completed,
            3 => Self::Failed,
            _ => Self::Idle,
        }
    }
}

/// Resets the run state when the run thread exits, including on panic.
struct StateGuard {
    state: Arc<AtomicU8>,
    terminal: RunState,
}

impl Drop for StateGuard {
    fn drop(&mut self) {
        self.state.store(self.terminal as u8, Ordering::Release);
    }
}

/// Handle to a running or completed analysis run.
pub struct RunHandle {
    /// Receiver for progress updates from the run thread.
    pub progress_rx: Receiver<ScanProgress>,
    outcome_rx: Receiver<RunOutcome>,
    /// Join handle for the run thread.
    _thread: Option<thread::JoinHandle<()>>,
}

impl RunHandle {
    /// Block until the run finishes.
    pub fn wait(self) -> RunOutcome {
        self.outcome_rx.recv().unwrap_or_else(|_| lost_outcome())
    }

    /// Block for at most `timeout`. `None` if the run is still going.
    ///
    /// The outcome is delivered once; later calls report a lost outcome.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<RunOutcome> {
        match self.outcome_rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(lost_outcome()),
        }
    }

    /// Non-blocking poll for the outcome.
    pub fn try_outcome(&self) -> Option<RunOutcome> {
        match self.outcome_rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(lost_outcome()),
        }
    }
}

fn lost_outcome() -> RunOutcome {
    RunOutcome::Failed(AnalysisError::Worker(
        "run thread exited without reporting an outcome".into(),
    ))
}

/// The analysis service: paths, config, run state and the result store.
///
/// Share it behind an `Arc` to query from several threads while a run is
/// in flight.
pub struct Analyzer {
    config: AnalysisConfig,
    paths: RwLock<Option<RootPaths>>,
    store: SharedStore,
    state: Arc<AtomicU8>,
}

impl Default for Analyzer {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

impl Analyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            config,
            paths: RwLock::new(None),
            store: Arc::new(ResultStore::new()),
            state: Arc::new(AtomicU8::new(RunState::Idle as u8)),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Record the roots for the next run. No existence check is made here.
    pub fn set_paths(&self, reference: impl Into<PathBuf>, candidate: impl Into<PathBuf>) {
        let paths = RootPaths {
            reference: reference.into(),
            candidate: candidate.into(),
        };
        info!(
            "Directories set: {} -> {}",
            paths.reference.display(),
            paths.candidate.display()
        );
        *self.paths.write() = Some(paths);
    }

    pub fn paths(&self) -> Option<RootPaths> {
        self.paths.read().clone()
    }

    /// Start a run on a background thread and return immediately.
    ///
    /// Fails with `AlreadyRunning` if a run is in flight (its results are
    /// left untouched) and with `PathsNotSet` before `set_paths`.
    pub fn start(&self) -> AnalysisResult<RunHandle> {
        let paths = self.paths().ok_or(AnalysisError::PathsNotSet)?;
        self.config.validate()?;

        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current == RunState::Running as u8 {
                return Err(AnalysisError::AlreadyRunning);
            }
            match self.state.compare_exchange_weak(
                current,
                RunState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }

        self.store.clear();

        let (progress_tx, progress_rx) =
            crossbeam_channel::bounded::<ScanProgress>(PROGRESS_CHANNEL_CAPACITY);
        let (outcome_tx, outcome_rx) = crossbeam_channel::bounded::<RunOutcome>(1);

        let config = self.config.clone();
        let store = Arc::clone(&self.store);
        let state = Arc::clone(&self.state);

        let spawned = thread::Builder::new()
            .name("bytesleuth-analyzer".into())
            .spawn(move || {
                let mut guard = StateGuard {
                    state,
                    terminal: RunState::Failed,
                };
                info!(
                    "Starting analysis of {} against {}",
                    paths.reference.display(),
                    paths.candidate.display()
                );

                let outcome = match walk::run_walk(&paths, &config, &store, &progress_tx) {
                    Ok(summary) => {
                        guard.terminal = RunState::Completed;
                        RunOutcome::Completed(summary)
                    }
                    Err(err) => {
                        error!("Error during analysis: {err}");
                        let _ = progress_tx.try_send(ScanProgress::Failed {
                            message: err.to_string(),
                        });
                        RunOutcome::Failed(err)
                    }
                };

                // Leave the running state before publishing the outcome so a
                // caller that wakes on it already sees `is_running() == false`.
                drop(guard);
                let _ = outcome_tx.send(outcome);
            });

        match spawned {
            Ok(handle) => Ok(RunHandle {
                progress_rx,
                outcome_rx,
                _thread: Some(handle),
            }),
            Err(e) => {
                self.state.store(RunState::Failed as u8, Ordering::Release);
                Err(AnalysisError::Worker(format!(
                    "failed to spawn analysis thread: {e}"
                )))
            }
        }
    }

    pub fn state(&self) -> RunState {
        RunState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// All file statuses of the current (or last) run, sorted by key.
    pub fn statuses(&self) -> Vec<FileStatus> {
        self.store.get_all()
    }

    /// Freshly computed statistics.
    pub fn stats(&self) -> AnalysisStats {
        compute_stats(&self.store)
    }

    /// Damage records for one file; empty if unknown or not damaged.
    pub fn damages(&self, file_name: &str) -> Arc<[DamageRecord]> {
        self.store.get_damages(file_name)
    }

    /// The underlying store, for derived views.
    pub fn store(&self) -> &ResultStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_without_paths_fails() {
        let analyzer = Analyzer::default();
        assert!(matches!(analyzer.start(), Err(AnalysisError::PathsNotSet)));
        assert_eq!(analyzer.state(), RunState::Idle);
    }

    #[test]
    fn state_round_trips_through_u8() {
        for s in [
            RunState::Idle,
            RunState::Running,
            RunState::Completed,
            RunState::Failed,
        ] {
            assert_eq!(RunState::from_u8(s as u8), s);
        }
    }

    #[test]
    fn guard_resets_state_on_drop() {
        let state = Arc::new(AtomicU8::new(RunState::Running as u8));
        {
            let _guard = StateGuard {
                state: Arc::clone(&state),
                terminal: RunState::Failed,
            };
        }
        assert_eq!(RunState::from_u8(state.load(Ordering::Acquire)), RunState::Failed);
    }

    #[test]
    fn start_is_rejected_while_state_is_running() {
        let analyzer = Analyzer::default();
        analyzer.set_paths("/ref", "/cand");
        analyzer.state.store(RunState::Running as u8, Ordering::Release);
        assert!(matches!(analyzer.start(), Err(AnalysisError::AlreadyRunning)));
    }

    #[test]
    fn start_rejects_oversized_chunk_before_running() {
        let analyzer = Analyzer::new(AnalysisConfig {
            workers: 2,
            chunk_size: usize::MAX,
            ..Default::default()
        });
        analyzer.set_paths("/ref", "/cand");
        assert!(matches!(analyzer.start(), Err(AnalysisError::Config(_))));
        assert_eq!(analyzer.state(), RunState::Idle);
    }
}
