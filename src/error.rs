//! Typed failures surfaced by the reduction pipeline.
//!
//! Most plumbing errors travel as `anyhow::Error` with context attached; these
//! are the kinds a caller is expected to inspect and act on (print
//! `undefined`, skip a file, abort one reduction).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum TraceError {
    /// The log file handed to the reducer does not exist.
    #[error("log file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// A line carried a record marker but its fields could not be extracted.
    /// Only fatal in strict mode.
    #[error("malformed {kind} line {line}")]
    MalformedLine { line: usize, kind: &'static str },

    /// A percentage was requested over zero samples.
    #[error("{metric} is undefined: no samples")]
    DivisionUndefined { metric: String },

    /// A percentile, mean or median was requested on an empty distribution.
    #[error("insufficient data for {metric}")]
    InsufficientData { metric: String },

    /// A filename did not follow the naming convention of the scan.
    #[error("skipping {file}: {reason}")]
    FilenameParseSkip { file: String, reason: String },
}

impl TraceError {
    pub fn division_undefined(metric: impl Into<String>) -> Self {
        Self::DivisionUndefined {
            metric: metric.into(),
        }
    }

    pub fn insufficient_data(metric: impl Into<String>) -> Self {
        Self::InsufficientData {
            metric: metric.into(),
        }
    }

    /// True for the aggregate-level kinds that the report renders as `undefined`.
    pub fn is_undefined_metric(&self) -> bool {
        matches!(
            self,
            Self::DivisionUndefined { .. } | Self::InsufficientData { .. }
        )
    }
}
