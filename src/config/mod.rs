//! Config layer: JSON shapes + validated in-memory structures.
//!
//! Kept apart from log classification and rendering. It owns the scan
//! configuration (`scan.json`) and its merge with command-line overrides.

pub mod scan;

pub use scan::{RawScanConfig, ValidatedScan};
