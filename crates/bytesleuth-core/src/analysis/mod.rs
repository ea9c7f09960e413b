/// Analysis modules — statistics and reports derived from the result store.

pub mod export;
pub mod stats;

pub use export::{to_json, write_csv, write_damages_csv, Report};
pub use stats::{compute_stats, damage_ranges, most_damaged, AnalysisStats, DamageRange};
