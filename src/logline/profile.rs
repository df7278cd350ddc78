//! Column layouts of the runtime trace formats.
//!
//! Offsets are token indices after splitting a line (whitespace for outcome and
//! workload lines, commas for segment rows). They are schema constants: when the
//! runtime changes its print format, the matching constant is the only edit.

use clap::ValueEnum;
use serde::Deserialize;

/// Marker substrings, checked in this order; the first one contained in a line wins.
pub const MEET_MARKER: &str = "meet deadline";
pub const MISS_MARKER: &str = "miss deadline";
pub const SCHEDULING_MARKER: &str = "scheduling count";
pub const WORKLOAD_MARKER: &str = "total workload";
pub const THREAD_MARKER: &str = "thread id";
pub const THROUGHPUT_MARKER: &str = "throughput is";

/// Position of the digit run that ends a function id inside the function field
/// of a segment row ("fn01y" -> "fn01").
pub const FUNCTION_ID_DIGITS_OFFSET: usize = 2;

/// Function id given to segment rows whose layout has no function column.
pub const UNNAMED_FUNCTION: &str = "all";

/// `<ts> <thread> total workload <inst> <realtime> <rt_count>`
pub const WORKLOAD_TIMESTAMP: usize = 0;
pub const WORKLOAD_THREAD: usize = 1;
pub const WORKLOAD_INSTANT: usize = 4;
pub const WORKLOAD_REALTIME: usize = 5;
pub const WORKLOAD_REALTIME_COUNT: usize = 6;

/// `thread id <thread> <ts> <inst>`; older runtimes print no real-time columns.
pub const THREAD_LINE_THREAD: usize = 2;
pub const THREAD_LINE_TIMESTAMP: usize = 3;
pub const THREAD_LINE_INSTANT: usize = 4;

/// Token offsets of an outcome ("meet deadline" / "miss deadline") line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutcomeLayout {
    pub request_type: usize,
    pub total_latency: usize,
    pub exec_time: Option<usize>,
    pub queue_time: Option<usize>,
    /// Only present on miss lines.
    pub delay: Option<usize>,
    pub thread: Option<usize>,
}

/// Column offsets of a comma-delimited per-segment timing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentLayout {
    pub request_id: usize,
    /// Rows without a function column are filed under `UNNAMED_FUNCTION`.
    pub function: Option<usize>,
    pub total: usize,
    pub queuing: usize,
    pub initializing: usize,
    pub runnable: usize,
    pub running: usize,
    pub blocked: usize,
    pub real_total: Option<usize>,
}

impl SegmentLayout {
    /// Number of fields a row needs before any mandatory column can be indexed.
    pub fn min_fields(&self) -> usize {
        [
            Some(self.request_id),
            self.function,
            Some(self.total),
            Some(self.queuing),
            Some(self.initializing),
            Some(self.runnable),
            Some(self.running),
            Some(self.blocked),
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
            + 1
    }
}

/// `meet deadline fib 12` / `miss deadline fib 40 7`
pub const BASIC_OUTCOME: OutcomeLayout = OutcomeLayout {
    request_type: 2,
    total_latency: 3,
    exec_time: None,
    queue_time: None,
    delay: Some(4),
    thread: None,
};

/// `3 req 17 meet deadline fib 12 9 2 [delay]`
pub const THREADED_OUTCOME: OutcomeLayout = OutcomeLayout {
    request_type: 5,
    total_latency: 6,
    exec_time: Some(7),
    queue_time: Some(8),
    delay: Some(9),
    thread: Some(0),
};

/// `2024-01-01 10:00:00 worker 3 sandbox 17 meet deadline fib 12 9 2 [delay]`
pub const VERBOSE_OUTCOME: OutcomeLayout = OutcomeLayout {
    request_type: 8,
    total_latency: 9,
    exec_time: Some(10),
    queue_time: Some(11),
    delay: Some(12),
    thread: Some(3),
};

/// `<seq>,<id>,<fn>,<state>,<deadline>,<total>,<queuing>,<init>,<runnable>,<running>,<blocked>,<proc>,<real_total>`
pub const DETAILED_SEGMENT: SegmentLayout = SegmentLayout {
    request_id: 1,
    function: Some(2),
    total: 5,
    queuing: 6,
    initializing: 7,
    runnable: 8,
    running: 9,
    blocked: 10,
    real_total: Some(12),
};

/// `<id>,<..>,<..>,<..>,<total>,<queuing>,<init>,<runnable>,<running>,<blocked>[,..]`
///
/// Per-request rows of the older runtime: keyed by the first column, no
/// function name.
pub const PER_REQUEST_SEGMENT: SegmentLayout = SegmentLayout {
    request_id: 0,
    function: None,
    total: 4,
    queuing: 5,
    initializing: 6,
    runnable: 7,
    running: 8,
    blocked: 9,
    real_total: None,
};

/// One of the log format versions seen in the wild. Selecting the profile picks
/// the column layouts; the classification logic itself is shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatProfile {
    #[default]
    Basic,
    Threaded,
    Verbose,
}

impl FormatProfile {
    pub fn outcome(self) -> OutcomeLayout {
        match self {
            FormatProfile::Basic => BASIC_OUTCOME,
            FormatProfile::Threaded => THREADED_OUTCOME,
            FormatProfile::Verbose => VERBOSE_OUTCOME,
        }
    }

    pub fn segment(self) -> SegmentLayout {
        match self {
            FormatProfile::Basic | FormatProfile::Threaded => DETAILED_SEGMENT,
            FormatProfile::Verbose => PER_REQUEST_SEGMENT,
        }
    }

    /// Name accepted by `--profile`, used when re-invoking the reducer.
    pub fn as_arg(self) -> &'static str {
        match self {
            FormatProfile::Basic => "basic",
            FormatProfile::Threaded => "threaded",
            FormatProfile::Verbose => "verbose",
        }
    }
}
