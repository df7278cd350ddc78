//! Single-file reduction: one streaming pass over a trace log, fanning each
//! classified record out to the aggregators.

pub mod artifacts;

use crate::Result;
use crate::error::TraceError;
use crate::logline::{self, FormatProfile, LogRecord, SkipReason};
use crate::model::{DeadlineAggregator, LifecycleReconstructor, WorkloadTracker};

use anyhow::Context;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

pub use artifacts::write_artifacts;

/// Percentiles always reported next to the requested one.
pub const DEFAULT_THRESHOLDS: [f64; 3] = [99.0, 99.9, 99.99];

#[derive(Debug, Clone)]
pub struct ReduceOptions {
    pub profile: FormatProfile,
    /// Percentile reported per request type.
    pub percentile: f64,
    /// Percentiles reported over all request types together.
    pub thresholds: Vec<f64>,
    /// Fail on a line that carries a marker but cannot be read.
    pub strict: bool,
}

impl Default for ReduceOptions {
    fn default() -> Self {
        Self {
            profile: FormatProfile::default(),
            percentile: 99.0,
            thresholds: DEFAULT_THRESHOLDS.to_vec(),
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineCounts {
    pub total: usize,
    pub unrecognized: usize,
    pub malformed: usize,
}

/// Everything learned from one log file.
#[derive(Debug)]
pub struct Report {
    pub source: PathBuf,
    pub percentile: f64,
    pub thresholds: Vec<f64>,
    pub outcomes: DeadlineAggregator,
    pub lifecycle: LifecycleReconstructor,
    pub workload: WorkloadTracker,
    pub scheduling_peak: Option<u64>,
    pub throughput: f64,
    pub lines: LineCounts,
}

impl Report {
    fn new(source: &Path, opts: &ReduceOptions) -> Self {
        Self {
            source: source.to_path_buf(),
            percentile: opts.percentile,
            thresholds: opts.thresholds.clone(),
            outcomes: DeadlineAggregator::new(),
            lifecycle: LifecycleReconstructor::new(),
            workload: WorkloadTracker::new(),
            scheduling_peak: None,
            throughput: 0.0,
            lines: LineCounts::default(),
        }
    }

    fn observe(&mut self, record: LogRecord) {
        match record {
            LogRecord::Outcome(rec) => self.outcomes.observe(&rec),
            LogRecord::SegmentTiming(rec) => self.lifecycle.observe(&rec),
            LogRecord::WorkloadSnapshot(rec) => self.workload.observe(&rec),
            LogRecord::SchedulingCounter { count } => {
                self.scheduling_peak = Some(self.scheduling_peak.map_or(count, |p| p.max(count)));
            }
            LogRecord::Throughput { requests_per_sec } => self.throughput += requests_per_sec,
            LogRecord::Unrecognized(SkipReason::NoMarker) => self.lines.unrecognized += 1,
            LogRecord::Unrecognized(SkipReason::Malformed(_)) => self.lines.malformed += 1,
        }
    }
}

/// Reduce the log at `path`.
pub fn reduce(path: &Path, opts: &ReduceOptions) -> Result<Report> {
    let file = File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => anyhow::Error::new(TraceError::FileNotFound {
            path: path.to_path_buf(),
        }),
        _ => anyhow::Error::new(e).context(format!("open log file {}", path.display())),
    })?;
    reduce_reader(BufReader::new(file), path, opts)
}

/// Reduce an already-open stream; `source` only names it in the report.
pub fn reduce_reader<R: BufRead>(mut reader: R, source: &Path, opts: &ReduceOptions) -> Result<Report> {
    let mut report = Report::new(source, opts);
    let mut buf = Vec::new();
    let mut lno = 0usize;

    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("read log file {} after line {}", source.display(), lno))?;
        if n == 0 {
            break;
        }
        lno += 1;

        // A trace cut off mid-write may end inside a multi-byte character.
        let line = String::from_utf8_lossy(&buf);
        let record = logline::classify(&line, opts.profile);
        if let LogRecord::Unrecognized(reason) = &record {
            match reason {
                SkipReason::Malformed(kind) if opts.strict => {
                    return Err(TraceError::MalformedLine { line: lno, kind: *kind }).with_context(|| {
                        format!("strict reduction of {}", source.display())
                    });
                }
                SkipReason::Malformed(kind) => {
                    log::debug!("{}:{}: skipping malformed {} line", source.display(), lno, kind)
                }
                SkipReason::NoMarker => {}
            }
        }
        report.observe(record);
    }
    report.lines.total = lno;

    let bad = report.lifecycle.inconsistencies();
    if bad > 0 {
        log::warn!(
            "{}: {} request(s) with phase sums exceeding their total",
            source.display(),
            bad
        );
    }
    log::info!(
        "{}: {} lines, {} outcomes, {} lifecycles, {} threads",
        source.display(),
        lno,
        report.outcomes.total_count(),
        report.lifecycle.len(),
        report.workload.threads().len()
    );

    Ok(report)
}
