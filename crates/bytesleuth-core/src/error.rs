/// Error taxonomy for the analysis engine.
///
/// Per-file I/O failures are isolated by the walker (the file is marked
/// `ERROR` and the walk continues); only `RootNotFound` aborts a run.
use std::io;
use std::path::PathBuf;

/// Errors raised by the analysis engine.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    /// The reference root does not exist.
    #[error("reference root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    /// `start()` was called while another run is still in flight.
    #[error("analysis already running")]
    AlreadyRunning,

    /// `start()` was called before `set_paths()`.
    #[error("reference and candidate roots have not been set")]
    PathsNotSet,

    /// Opening or reading one of the compared files failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Configuration could not be loaded or failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The background run thread or its comparison pool could not be
    /// started, or exited without reporting.
    #[error("worker failure: {0}")]
    Worker(String),
}

impl AnalysisError {
    /// Wrap an `io::Error` with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used across the crate.
pub type AnalysisResult<T> = Result<T, AnalysisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_message_names_the_path() {
        let err = AnalysisError::io(
            "/data/ref/a.bin",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("a.bin"), "message was {msg}");
        assert!(msg.contains("denied"), "message was {msg}");
    }

    #[test]
    fn root_not_found_displays_path() {
        let err = AnalysisError::RootNotFound(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "reference root not found: /nope");
    }
}
