use crate::logline::profile::{self, FormatProfile, OutcomeLayout, SegmentLayout};
use crate::logline::row::{
    LogRecord, Outcome, OutcomeRecord, SegmentTimingRecord, SkipReason, WorkloadSnapshotRecord,
};

/// Classify one raw trace line.
///
/// Total over all inputs: anything that cannot be read yields
/// `LogRecord::Unrecognized`. Markers are tested by containment in a fixed
/// order (outcome markers first); only when none matches is the line tried as a
/// comma-delimited segment row.
///
/// Examples (basic profile):
/// meet deadline fib 12
/// miss deadline fib 40 7
/// scheduling count: 1234
/// 1700000000 3 total workload 40 12 2
/// 0,42,fn01y,complete,100,100,20,5,50,10,15,2400,120
pub fn classify(line: &str, profile: FormatProfile) -> LogRecord {
    let line = line.trim();
    if line.is_empty() {
        return LogRecord::Unrecognized(SkipReason::NoMarker);
    }

    if line.contains(profile::MEET_MARKER) {
        return parse_outcome(line, Outcome::Meet, profile.outcome());
    }
    if line.contains(profile::MISS_MARKER) {
        return parse_outcome(line, Outcome::Miss, profile.outcome());
    }
    if line.contains(profile::SCHEDULING_MARKER) {
        return parse_scheduling_count(line);
    }
    if line.contains(profile::WORKLOAD_MARKER) {
        return parse_workload(line);
    }
    if line.contains(profile::THREAD_MARKER) {
        return parse_thread_line(line);
    }
    if line.contains(profile::THROUGHPUT_MARKER) {
        return parse_throughput(line);
    }

    parse_segment(line, profile.segment())
}

fn malformed(kind: &'static str) -> LogRecord {
    LogRecord::Unrecognized(SkipReason::Malformed(kind))
}

fn field_u64(fields: &[&str], idx: usize) -> Option<u64> {
    fields.get(idx)?.trim().trim_end_matches([',', ':']).parse().ok()
}

/// Optional columns: an absent column is `None`, a present but unreadable one
/// makes the whole line malformed.
fn optional_u64(fields: &[&str], idx: Option<usize>) -> Result<Option<u64>, ()> {
    match idx {
        Some(i) if i < fields.len() => field_u64(fields, i).map(Some).ok_or(()),
        _ => Ok(None),
    }
}

fn parse_outcome(line: &str, kind: Outcome, layout: OutcomeLayout) -> LogRecord {
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() <= layout.total_latency || fields.len() <= layout.request_type {
        return malformed("outcome");
    }

    let Some(total_latency_us) = field_u64(&fields, layout.total_latency) else {
        return malformed("outcome");
    };
    let request_type = fields[layout.request_type].to_string();

    let delay = if kind == Outcome::Miss {
        layout.delay
    } else {
        None
    };
    let (Ok(exec_time_us), Ok(queue_time_us), Ok(delay_us)) = (
        optional_u64(&fields, layout.exec_time),
        optional_u64(&fields, layout.queue_time),
        optional_u64(&fields, delay),
    ) else {
        return malformed("outcome");
    };

    let thread_id = layout
        .thread
        .and_then(|i| fields.get(i))
        .map(|s| s.to_string());

    LogRecord::Outcome(OutcomeRecord {
        kind,
        request_type,
        total_latency_us,
        exec_time_us,
        queue_time_us,
        delay_us,
        thread_id,
    })
}

fn parse_scheduling_count(line: &str) -> LogRecord {
    let Some(pos) = line.find(profile::SCHEDULING_MARKER) else {
        return malformed("scheduling count");
    };
    let rest = &line[pos + profile::SCHEDULING_MARKER.len()..];
    let count = rest
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c == ':' || c == ','))
        .find(|t| !t.is_empty())
        .and_then(|t| t.parse::<u64>().ok());
    match count {
        Some(count) => LogRecord::SchedulingCounter { count },
        None => malformed("scheduling count"),
    }
}

fn parse_workload(line: &str) -> LogRecord {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (Some(timestamp_us), Some(thread), Some(inst), Some(rt), Some(rt_count)) = (
        field_u64(&fields, profile::WORKLOAD_TIMESTAMP),
        fields.get(profile::WORKLOAD_THREAD),
        field_u64(&fields, profile::WORKLOAD_INSTANT),
        field_u64(&fields, profile::WORKLOAD_REALTIME),
        field_u64(&fields, profile::WORKLOAD_REALTIME_COUNT),
    ) else {
        return malformed("workload");
    };
    LogRecord::WorkloadSnapshot(WorkloadSnapshotRecord {
        timestamp_us,
        thread_id: thread.to_string(),
        instantaneous_workload: inst,
        realtime_workload: rt,
        realtime_request_count: rt_count,
    })
}

fn parse_thread_line(line: &str) -> LogRecord {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let (Some(thread), Some(timestamp_us), Some(inst)) = (
        fields.get(profile::THREAD_LINE_THREAD),
        field_u64(&fields, profile::THREAD_LINE_TIMESTAMP),
        field_u64(&fields, profile::THREAD_LINE_INSTANT),
    ) else {
        return malformed("thread workload");
    };
    LogRecord::WorkloadSnapshot(WorkloadSnapshotRecord {
        timestamp_us,
        thread_id: thread.trim_end_matches([',', ':']).to_string(),
        instantaneous_workload: inst,
        realtime_workload: 0,
        realtime_request_count: 0,
    })
}

fn parse_throughput(line: &str) -> LogRecord {
    let Some(pos) = line.find(profile::THROUGHPUT_MARKER) else {
        return malformed("throughput");
    };
    let value = line[pos + profile::THROUGHPUT_MARKER.len()..]
        .split_whitespace()
        .next()
        .map(|t| t.trim_end_matches(','))
        .and_then(|t| t.parse::<f64>().ok())
        .filter(|v| v.is_finite());
    match value {
        Some(requests_per_sec) => LogRecord::Throughput { requests_per_sec },
        None => malformed("throughput"),
    }
}

/// Cut a function field after the digit run at `FUNCTION_ID_DIGITS_OFFSET`:
/// one digit, or two when the next character is a digit too.
pub fn function_id(field: &str) -> &str {
    let bytes = field.as_bytes();
    let at = profile::FUNCTION_ID_DIGITS_OFFSET;
    match bytes.get(at) {
        Some(b) if b.is_ascii_digit() => {
            if bytes.get(at + 1).is_some_and(|b| b.is_ascii_digit()) {
                &field[..at + 2]
            } else {
                &field[..at + 1]
            }
        }
        _ => field,
    }
}

fn parse_segment(line: &str, layout: SegmentLayout) -> LogRecord {
    if !line.contains(',') {
        return LogRecord::Unrecognized(SkipReason::NoMarker);
    }
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();

    // Header rows and other text tables fail the numeric request-id check.
    if fields
        .get(layout.request_id)
        .is_none_or(|f| f.parse::<u64>().is_err())
    {
        return LogRecord::Unrecognized(SkipReason::NoMarker);
    }
    if fields.len() < layout.min_fields() {
        return malformed("segment");
    }

    let (
        Some(total_us),
        Some(queuing_us),
        Some(initializing_us),
        Some(runnable_us),
        Some(running_us),
        Some(blocked_us),
    ) = (
        field_u64(&fields, layout.total),
        field_u64(&fields, layout.queuing),
        field_u64(&fields, layout.initializing),
        field_u64(&fields, layout.runnable),
        field_u64(&fields, layout.running),
        field_u64(&fields, layout.blocked),
    )
    else {
        return malformed("segment");
    };
    // The real-total column is trailing and frequently cut off; tolerate junk there.
    let real_total_us = layout.real_total.and_then(|i| field_u64(&fields, i));

    LogRecord::SegmentTiming(SegmentTimingRecord {
        request_id: fields[layout.request_id].to_string(),
        function_id: layout
            .function
            .map_or(profile::UNNAMED_FUNCTION, |i| function_id(fields[i]))
            .to_string(),
        total_us,
        queuing_us,
        initializing_us,
        runnable_us,
        running_us,
        blocked_us,
        real_total_us,
    })
}
