//! Classification of raw runtime trace lines into typed records.

pub mod parse;
pub mod profile;
pub mod row;

pub use parse::classify;
pub use profile::FormatProfile;
pub use row::{
    LogRecord, Outcome, OutcomeRecord, SegmentTimingRecord, SkipReason, WorkloadSnapshotRecord,
};
