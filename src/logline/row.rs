/// Whether an outcome line reported a met or a missed deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Meet,
    Miss,
}

/// One request's deadline outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeRecord {
    pub kind: Outcome,
    pub request_type: String,
    pub total_latency_us: u64,
    pub exec_time_us: Option<u64>,
    pub queue_time_us: Option<u64>,
    /// Miss lines only.
    pub delay_us: Option<u64>,
    pub thread_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadSnapshotRecord {
    pub timestamp_us: u64,
    pub thread_id: String,
    pub instantaneous_workload: u64,
    pub realtime_workload: u64,
    pub realtime_request_count: u64,
}

/// One scheduling quantum of a request; a request may log several of these.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentTimingRecord {
    pub request_id: String,
    pub function_id: String,
    pub total_us: u64,
    pub queuing_us: u64,
    pub initializing_us: u64,
    pub runnable_us: u64,
    pub running_us: u64,
    pub blocked_us: u64,
    pub real_total_us: Option<u64>,
}

/// Why a line produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoMarker,
    /// A marker matched but a field was missing or not a number.
    Malformed(&'static str),
}

/// Exactly one of these per input line.
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    Outcome(OutcomeRecord),
    SchedulingCounter { count: u64 },
    WorkloadSnapshot(WorkloadSnapshotRecord),
    SegmentTiming(SegmentTimingRecord),
    Throughput { requests_per_sec: f64 },
    Unrecognized(SkipReason),
}
