/// Analysis configuration — the policies that control how files are
/// matched, how trailing bytes are treated, and how offsets are computed.
///
/// Defaults reproduce the classic behaviour: match by base name, ignore
/// trailing bytes, sequential comparison. Offsets default to 64-bit; the
/// 32-bit signed wrap is only reachable through `OffsetWidth::Legacy32`.
use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest accepted streaming chunk size (64 MiB). Each comparison holds
/// two buffers of this size.
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Default streaming chunk size (8 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// How a reference file is paired with its candidate counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPolicy {
    /// Key on the base name only; the candidate is `candidate_root/<name>`.
    /// Same-named files in different sub-directories collide.
    #[default]
    BaseName,
    /// Key on the path relative to the reference root; the candidate is
    /// `candidate_root/<relative path>`.
    RelativePath,
}

/// What to do with the bytes past the end of the shorter file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrailingPolicy {
    /// Log the length mismatch but emit no damage records for it.
    #[default]
    Ignore,
    /// Emit a `Truncated` or `Extended` record for every trailing byte.
    Report,
}

/// Arithmetic width used for damage offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffsetWidth {
    /// Full 64-bit offsets.
    #[default]
    Wide,
    /// Truncate to a 32-bit signed integer. Offsets past 2 GiB wrap negative.
    Legacy32,
}

/// Full set of analysis options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub match_policy: MatchPolicy,
    pub trailing: TrailingPolicy,
    pub offsets: OffsetWidth,
    /// Bytes read from each file per step.
    pub chunk_size: usize,
    /// Number of concurrent comparisons. `1` is sequential, `0` means one
    /// per logical CPU.
    pub workers: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            match_policy: MatchPolicy::default(),
            trailing: TrailingPolicy::default(),
            offsets: OffsetWidth::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: 1,
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn load(path: &Path) -> AnalysisResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AnalysisError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| AnalysisError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> AnalysisResult<()> {
        if self.chunk_size == 0 {
            return Err(AnalysisError::Config("chunk_size must be > 0".into()));
        }
        if self.chunk_size > MAX_CHUNK_SIZE {
            return Err(AnalysisError::Config(format!(
                "chunk_size {} exceeds the {} byte limit",
                self.chunk_size, MAX_CHUNK_SIZE
            )));
        }
        Ok(())
    }

    /// The worker count with `0` resolved to the number of logical CPUs.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => num_cpus::get().max(1),
            n => n,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_classic_behaviour() {
        let cfg = AnalysisConfig::default();
        assert_eq!(cfg.match_policy, MatchPolicy::BaseName);
        assert_eq!(cfg.trailing, TrailingPolicy::Ignore);
        assert_eq!(cfg.offsets, OffsetWidth::Wide);
        assert_eq!(cfg.chunk_size, 8192);
        assert_eq!(cfg.effective_workers(), 1);
    }

    #[test]
    fn zero_workers_resolves_to_cpu_count() {
        let cfg = AnalysisConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(cfg.effective_workers() >= 1);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let cfg = AnalysisConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn oversized_chunk_size_is_rejected() {
        let at_limit = AnalysisConfig {
            chunk_size: MAX_CHUNK_SIZE,
            ..Default::default()
        };
        assert!(at_limit.validate().is_ok());

        let huge = AnalysisConfig {
            chunk_size: usize::MAX,
            ..Default::default()
        };
        assert!(matches!(huge.validate(), Err(AnalysisError::Config(_))));
    }

    #[test]
    fn load_partial_json_fills_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "match_policy": "relative-path", "trailing": "report" }}"#
        )
        .unwrap();

        let cfg = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(cfg.match_policy, MatchPolicy::RelativePath);
        assert_eq!(cfg.trailing, TrailingPolicy::Report);
        assert_eq!(cfg.offsets, OffsetWidth::Wide);
        assert_eq!(cfg.chunk_size, DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn load_rejects_malformed_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(
            AnalysisConfig::load(file.path()),
            Err(AnalysisError::Config(_))
        ));
    }
}
