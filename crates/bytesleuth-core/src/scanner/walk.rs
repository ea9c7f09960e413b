/// Reference-tree walker — visits every regular file under the reference
/// root (including symlinks to regular files), pairs it with its candidate
/// counterpart and records the outcome.
///
/// Traversal uses `jwalk` in serial mode with sorted entries, so the visit
/// order is stable for an unchanged tree. Comparisons run on the walking
/// thread when `workers == 1`; otherwise paths are fed through a bounded
/// channel to a dedicated rayon pool of `workers` threads.
///
/// # Failure isolation
///
/// A file that cannot be opened or read is stored as `ERROR` and the walk
/// moves on. Unreadable sub-directories are logged and counted. Only a
/// missing reference root aborts the run, and it does so before any entry
/// is written. A reference root that is a file is compared on its own
/// against the same-named file in the candidate root.
use crate::analysis::compute_stats;
use crate::config::{AnalysisConfig, MatchPolicy};
use crate::diff::{compare_files, DiffOptions};
use crate::error::{AnalysisError, AnalysisResult};
use crate::model::FileStatus;
use crate::scanner::progress::{RunSummary, ScanProgress};
use crate::scanner::RootPaths;
use crate::store::ResultStore;
use compact_str::CompactString;
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Send a `FileDone`/`Update` pair roughly this often.
const UPDATE_EVERY: u64 = 100;

/// Shared state for one walk, borrowed by every comparison.
struct WalkContext<'a> {
    paths: &'a RootPaths,
    policy: MatchPolicy,
    opts: DiffOptions,
    store: &'a ResultStore,
    progress_tx: &'a Sender<ScanProgress>,
    files_done: AtomicU64,
    collisions: AtomicU64,
}

/// Walk the reference tree and populate `store`.
pub(crate) fn run_walk(
    paths: &RootPaths,
    config: &AnalysisConfig,
    store: &ResultStore,
    progress_tx: &Sender<ScanProgress>,
) -> AnalysisResult<RunSummary> {
    let start = Instant::now();
    let started_at = chrono::Local::now();

    if !paths.reference.exists() {
        return Err(AnalysisError::RootNotFound(paths.reference.clone()));
    }
    let root_is_dir = paths.reference.is_dir();

    let _ = progress_tx.try_send(ScanProgress::Started {
        reference: paths.reference.clone(),
        candidate: paths.candidate.clone(),
    });

    let ctx = WalkContext {
        paths,
        policy: config.match_policy,
        opts: DiffOptions::from(config),
        store,
        progress_tx,
        files_done: AtomicU64::new(0),
        collisions: AtomicU64::new(0),
    };

    // A file given as the reference root is compared on its own.
    let single_file = (!root_is_dir).then(|| paths.reference.clone());

    let mut traversal_errors: u64 = 0;
    let walked = if root_is_dir {
        let walk = jwalk::WalkDir::new(&paths.reference)
            .skip_hidden(false)
            .follow_links(false)
            .sort(true)
            .parallelism(jwalk::Parallelism::Serial)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(e) if e.file_type().is_file() => Some(e.path()),
                Ok(e) if e.file_type().is_symlink() => linked_file(e.path()),
                Ok(_) => None,
                Err(err) => {
                    traversal_errors += 1;
                    let path = err
                        .path()
                        .map(|p| p.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    warn!("Cannot read {}: {}", path, err);
                    let _ = progress_tx.try_send(ScanProgress::Error {
                        path,
                        message: err.to_string(),
                    });
                    None
                }
            });
        Some(walk)
    } else {
        None
    };
    let files = single_file.into_iter().chain(walked.into_iter().flatten());

    let workers = config.effective_workers();
    if workers <= 1 {
        for path in files {
            ctx.process(&path);
        }
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("bytesleuth-compare-{i}"))
            .build()
            .map_err(|e| AnalysisError::Worker(e.to_string()))?;

        feed_pool(&pool, workers, files, |path| ctx.process(path));
    }

    let duration = start.elapsed();
    let files_compared = ctx.files_done.load(Ordering::Relaxed);
    let stats = compute_stats(store);
    info!(
        "Analysis complete: {} files ({} ok, {} damaged, {} missing, {} errors) in {:?}",
        stats.total_files,
        stats.ok_files,
        stats.damaged_files,
        stats.missing_files,
        stats.error_files,
        duration
    );

    let _ = progress_tx.try_send(ScanProgress::Complete {
        duration,
        files_done: files_compared,
    });

    Ok(RunSummary {
        stats,
        files_compared,
        traversal_errors,
        collisions: ctx.collisions.load(Ordering::Relaxed),
        started_at,
        finished_at: chrono::Local::now(),
        duration,
    })
}

/// Follow a symlink found in the reference tree. Links to regular files are
/// compared through the link; links to directories are not descended into
/// and dangling links are skipped.
fn linked_file(path: PathBuf) -> Option<PathBuf> {
    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Some(path),
        Ok(_) => None,
        Err(err) => {
            debug!("Skipping dangling link {}: {}", path.display(), err);
            None
        }
    }
}

/// Hand `files` to `workers` tasks on `pool` through a bounded channel.
///
/// The feeding side keeps only the sender, so if every task dies the next
/// `send` fails and feeding stops instead of blocking on a full channel.
/// A task panic is re-raised once the scope has drained.
fn feed_pool<I, F>(pool: &rayon::ThreadPool, workers: usize, files: I, process: F)
where
    I: Iterator<Item = PathBuf>,
    F: Fn(&Path) + Sync,
{
    let (path_tx, path_rx) = crossbeam_channel::bounded::<PathBuf>(workers * 4);
    let process = &process;
    pool.in_place_scope(move |scope| {
        for _ in 0..workers {
            let rx = path_rx.clone();
            scope.spawn(move |_| {
                for path in rx {
                    process(&path);
                }
            });
        }
        drop(path_rx);

        for path in files {
            if path_tx.send(path).is_err() {
                warn!("Comparison workers exited early; stopping the walk");
                break;
            }
        }
    });
}

impl WalkContext<'_> {
    /// Classify one reference file and write the result into the store.
    fn process(&self, reference_file: &Path) {
        let (key, relative) = match_key(reference_file, &self.paths.reference, self.policy);
        let status = self.classify(reference_file, key, &relative);
        let done = self.files_done.fetch_add(1, Ordering::Relaxed) + 1;

        if done.is_multiple_of(UPDATE_EVERY) {
            let _ = self.progress_tx.try_send(ScanProgress::FileDone {
                file_name: status.file_name.to_string(),
                status: status.status,
            });
            let _ = self.progress_tx.try_send(ScanProgress::Update {
                files_done: done,
                current_path: reference_file.to_string_lossy().into_owned(),
            });
        }

        if let Some(prev) = self.store.insert(status) {
            self.collisions.fetch_add(1, Ordering::Relaxed);
            debug!(
                "Key collision on {}: earlier {} result overwritten",
                prev.file_name, prev.status
            );
        }
    }

    fn classify(&self, reference_file: &Path, key: CompactString, relative: &Path) -> FileStatus {
        let candidate = self.paths.candidate.join(relative);

        match candidate.try_exists() {
            Ok(true) => {}
            Ok(false) => {
                debug!("Missing counterpart for {}", reference_file.display());
                return FileStatus::missing(key);
            }
            Err(e) => return self.failed(key, AnalysisError::io(&candidate, e)),
        }

        match compare_files(reference_file, &candidate, &self.opts) {
            Ok(outcome) => FileStatus::compared(key, outcome.damages, outcome.length_mismatch),
            Err(e) => self.failed(key, e),
        }
    }

    fn failed(&self, key: CompactString, err: AnalysisError) -> FileStatus {
        error!("Error analyzing file {}: {}", key, err);
        let path = match &err {
            AnalysisError::Io { path, .. } => path.to_string_lossy().into_owned(),
            _ => key.to_string(),
        };
        let _ = self.progress_tx.try_send(ScanProgress::Error {
            path,
            message: err.to_string(),
        });
        FileStatus::error(key, err.to_string())
    }
}

/// Derive the store key and the candidate-relative path for a reference
/// file.
///
/// `BaseName` discards the directory structure; `RelativePath` keeps it,
/// joining components with `/` so keys look the same on every platform.
pub fn match_key(
    reference_file: &Path,
    reference_root: &Path,
    policy: MatchPolicy,
) -> (CompactString, PathBuf) {
    match policy {
        MatchPolicy::BaseName => {
            let name = reference_file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| reference_file.to_string_lossy().into_owned());
            (CompactString::from(name.as_str()), PathBuf::from(name))
        }
        MatchPolicy::RelativePath => {
            let relative = match reference_file.strip_prefix(reference_root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel.to_path_buf(),
                // The root itself is the file.
                Ok(_) => reference_file.file_name().map(PathBuf::from).unwrap_or_default(),
                Err(_) => reference_file.to_path_buf(),
            };
            let key = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            (CompactString::from(key), relative)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_name_key_drops_directories() {
        let (key, rel) = match_key(
            Path::new("/ref/bin/tools/ls"),
            Path::new("/ref"),
            MatchPolicy::BaseName,
        );
        assert_eq!(key, "ls");
        assert_eq!(rel, PathBuf::from("ls"));
    }

    #[test]
    fn relative_key_keeps_directories() {
        let (key, rel) = match_key(
            Path::new("/ref/bin/tools/ls"),
            Path::new("/ref"),
            MatchPolicy::RelativePath,
        );
        assert_eq!(key, "bin/tools/ls");
        assert_eq!(rel, PathBuf::from("bin/tools/ls"));
    }

    #[test]
    fn relative_key_of_a_file_root_is_its_name() {
        let (key, rel) = match_key(
            Path::new("/ref/image.iso"),
            Path::new("/ref/image.iso"),
            MatchPolicy::RelativePath,
        );
        assert_eq!(key, "image.iso");
        assert_eq!(rel, PathBuf::from("image.iso"));
    }

    #[test]
    fn feeding_stops_when_every_worker_panics() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(2)
            .build()
            .unwrap();
        let files = (0..1_000).map(|i| PathBuf::from(format!("f{i}.bin")));

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        std::thread::spawn(move || {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                feed_pool(&pool, 2, files, |_| panic!("comparison blew up"));
            }));
            let _ = done_tx.send(result.is_err());
        });

        let panicked = done_rx
            .recv_timeout(std::time::Duration::from_secs(30))
            .expect("feeding blocked after all workers died");
        assert!(panicked, "worker panic should reach the caller");
    }

    #[test]
    fn feeding_visits_every_path_once() {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .unwrap();
        let seen = parking_lot::Mutex::new(Vec::new());
        let files = (0..250).map(|i| PathBuf::from(format!("f{i:03}.bin")));

        feed_pool(&pool, 3, files, |p| seen.lock().push(p.to_path_buf()));

        let mut seen = seen.into_inner();
        seen.sort();
        assert_eq!(seen.len(), 250);
        assert_eq!(seen[0], PathBuf::from("f000.bin"));
        assert_eq!(seen[249], PathBuf::from("f249.bin"));
    }

    #[cfg(unix)]
    #[test]
    fn linked_file_follows_file_links_only() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real.bin");
        std::fs::write(&real, b"data").unwrap();
        std::os::unix::fs::symlink(&real, dir.path().join("file_link")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("dir_link")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("gone"), dir.path().join("dangling")).unwrap();

        assert!(linked_file(dir.path().join("file_link")).is_some());
        assert!(linked_file(dir.path().join("dir_link")).is_none());
        assert!(linked_file(dir.path().join("dangling")).is_none());
    }
}
