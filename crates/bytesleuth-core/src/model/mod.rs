/// Data model for analysis results.
///
/// Plain values shared between the diff engine, the result store and the
/// callers that read it.
pub mod damage;
pub mod file_status;
pub mod format;

pub use damage::{DamageKind, DamageRecord};
pub use file_status::{FileStatus, LengthMismatch, Status};
