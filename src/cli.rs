use bytesleuth_core::{AnalysisConfig, MatchPolicy, OffsetWidth, TrailingPolicy};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "ByteSleuth",
    about = "Compare a reference directory tree against a damaged copy, byte by byte",
    version
)]
pub struct Cli {
    /// Authoritative directory tree, or a single reference file.
    pub reference: PathBuf,

    /// Directory tree to check for corruption.
    pub candidate: PathBuf,

    /// JSON config file; flags below override its values.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// How reference files are paired with candidate files.
    #[arg(long, value_enum)]
    pub match_by: Option<MatchArg>,

    /// Whether bytes past the end of the shorter file count as damage.
    #[arg(long, value_enum)]
    pub trailing: Option<TrailingArg>,

    /// Offset arithmetic width.
    #[arg(long, value_enum)]
    pub offsets: Option<OffsetArg>,

    /// Concurrent comparisons (0 = one per CPU).
    #[arg(long)]
    pub workers: Option<usize>,

    /// Bytes read per step from each file.
    #[arg(long)]
    pub chunk_size: Option<usize>,

    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print damage ranges for every damaged file (text format).
    #[arg(long)]
    pub details: bool,

    /// List the N most damaged files (text format).
    #[arg(long, default_value_t = 0)]
    pub top: usize,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum MatchArg {
    BaseName,
    RelativePath,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum TrailingArg {
    Ignore,
    Report,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OffsetArg {
    Wide,
    Legacy32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

impl Cli {
    /// Merge the optional config file with command-line overrides.
    pub fn analysis_config(&self) -> bytesleuth_core::AnalysisResult<AnalysisConfig> {
        let mut cfg = match &self.config {
            Some(path) => AnalysisConfig::load(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(m) = self.match_by {
            cfg.match_policy = match m {
                MatchArg::BaseName => MatchPolicy::BaseName,
                MatchArg::RelativePath => MatchPolicy::RelativePath,
            };
        }
        if let Some(t) = self.trailing {
            cfg.trailing = match t {
                TrailingArg::Ignore => TrailingPolicy::Ignore,
                TrailingArg::Report => TrailingPolicy::Report,
            };
        }
        if let Some(o) = self.offsets {
            cfg.offsets = match o {
                OffsetArg::Wide => OffsetWidth::Wide,
                OffsetArg::Legacy32 => OffsetWidth::Legacy32,
            };
        }
        if let Some(w) = self.workers {
            cfg.workers = w;
        }
        if let Some(c) = self.chunk_size {
            cfg.chunk_size = c;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "ByteSleuth",
            "/ref",
            "/cand",
            "--match-by",
            "relative-path",
            "--trailing",
            "report",
            "--offsets",
            "legacy32",
            "--workers",
            "3",
        ]);
        let cfg = cli.analysis_config().unwrap();
        assert_eq!(cfg.match_policy, MatchPolicy::RelativePath);
        assert_eq!(cfg.trailing, TrailingPolicy::Report);
        assert_eq!(cfg.offsets, OffsetWidth::Legacy32);
        assert_eq!(cfg.workers, 3);
        assert_eq!(cli.format, OutputFormat::Text);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let cli = Cli::parse_from(["ByteSleuth", "/ref", "/cand", "--chunk-size", "0"]);
        assert!(cli.analysis_config().is_err());
    }
}
