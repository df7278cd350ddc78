use crate::error::TraceError;
use crate::model::Phase;
use crate::reduce::Report;

/// Printed wherever a metric has no samples to be computed from.
pub const UNDEFINED: &str = "undefined";

fn metric(value: Result<f64, TraceError>) -> String {
    match value {
        Ok(v) => format!("{v:.2}"),
        Err(e) => {
            if !e.is_undefined_metric() {
                log::warn!("{e}");
            }
            UNDEFINED.to_string()
        }
    }
}

/// Thresholds reported over all types: the fixed ones plus the requested
/// percentile, without duplicates, in the order given.
fn global_percentiles(report: &Report) -> Vec<f64> {
    let mut out = report.thresholds.clone();
    if !out.contains(&report.percentile) {
        out.push(report.percentile);
    }
    out
}

/// Format `report` as newline-terminated report lines.
pub fn render_report(report: &Report) -> String {
    let agg = &report.outcomes;
    let p = report.percentile;
    let mut lines = vec![
        format!("meet deadline num: {}", agg.meet_count()),
        format!("miss deadline num: {}", agg.miss_count()),
        format!("miss deadline percentage: {}", metric(agg.miss_rate())),
        format!(
            "scheduling counter: {}",
            report
                .scheduling_peak
                .map_or_else(|| UNDEFINED.to_string(), |c| c.to_string())
        ),
        format!("throughput: {:.2}", report.throughput),
        format!(
            "skipped lines: {} malformed: {} of {}",
            report.lines.unrecognized, report.lines.malformed, report.lines.total
        ),
    ];

    for (ty, dist) in agg.types() {
        lines.push(format!("{ty} proportion: {}", metric(agg.proportion(ty))));
        lines.push(format!(
            "{ty} miss deadline rate:{} miss count is {} total request {}",
            metric(agg.type_miss_rate(ty)),
            dist.count_miss,
            dist.total()
        ));
        lines.push(format!(
            "function times: {ty} {} {} {}",
            metric(agg.mean(ty)),
            metric(agg.mean_exec_time(ty)),
            agg.max(ty)
                .map_or_else(|_| UNDEFINED.to_string(), |m| m.to_string())
        ));
        lines.push(format!(
            "{ty} {p} percentile latency is {}",
            metric(agg.percentile(ty, p))
        ));
        lines.push(format!(
            "{ty} {p} percentile slow down is {}",
            metric(agg.slowdown_percentile(ty, p))
        ));
        lines.push(format!("{ty} mean delay is {}", metric(agg.mean_delay(ty))));
    }

    for t in global_percentiles(report) {
        lines.push(format!(
            "{t} percentile latency is {}",
            metric(agg.global_percentile(t))
        ));
        lines.push(format!(
            "{t} percentile slow down is {}",
            metric(agg.global_slowdown_percentile(t))
        ));
    }

    for (tid, series) in report.workload.threads() {
        lines.push(format!(
            "thread {tid} max workload: {} max realtime workload: {} samples: {}",
            series.max_instantaneous,
            series.max_realtime,
            series.samples.len()
        ));
    }

    for (tid, n) in agg.outcomes_by_thread() {
        lines.push(format!("thread {tid} outcomes: {n}"));
    }

    let by_function = report.lifecycle.regroup_by_function();
    for (label, stat) in [("median", true), ("mean", false)] {
        for (func, dists) in &by_function {
            let phases: Vec<String> = Phase::ALL
                .iter()
                .map(|&ph| {
                    let v = if stat { dists.median(ph) } else { dists.mean(ph) };
                    format!("{} {}", ph.name(), metric(v))
                })
                .collect();
            lines.push(format!("lifecycle {label}: {func} {}", phases.join(" ")));
        }
    }
    lines.push(format!(
        "lifecycle inconsistencies: {}",
        report.lifecycle.inconsistencies()
    ));

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::{ReduceOptions, reduce_reader};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;
    use std::path::Path;

    fn render(text: &str) -> String {
        let report = reduce_reader(
            Cursor::new(text.as_bytes()),
            Path::new("t.log"),
            &ReduceOptions::default(),
        )
        .unwrap();
        render_report(&report)
    }

    #[test]
    fn full_report_layout() {
        let got = render(
            "\
meet deadline fib 12
miss deadline fib 40 7
scheduling count: 30
throughput is 100.5,
100 1 total workload 5 2 1
x,42,fn01y,0,0,100,20,5,50,10,15
",
        );
        let want = "\
meet deadline num: 1
miss deadline num: 1
miss deadline percentage: 50.00
scheduling counter: 30
throughput: 100.50
skipped lines: 0 malformed: 0 of 6
fib proportion: 100.00
fib miss deadline rate:50.00 miss count is 1 total request 2
function times: fib 26.00 undefined 40
fib 99 percentile latency is 39.72
fib 99 percentile slow down is undefined
fib mean delay is 7.00
99 percentile latency is 39.72
99 percentile slow down is undefined
99.9 percentile latency is 39.97
99.9 percentile slow down is undefined
99.99 percentile latency is 40.00
99.99 percentile slow down is undefined
thread 1 max workload: 5 max realtime workload: 2 samples: 1
lifecycle median: fn01 total 100.00 running 10.00 queuing 20.00 runnable 50.00 blocked 15.00 initializing 5.00
lifecycle mean: fn01 total 100.00 running 10.00 queuing 20.00 runnable 50.00 blocked 15.00 initializing 5.00
lifecycle inconsistencies: 0
";
        assert_eq!(got, want);
    }

    #[test]
    fn empty_log_reports_undefined_not_zero() {
        let got = render("");
        assert!(got.contains("miss deadline percentage: undefined\n"));
        assert!(got.contains("scheduling counter: undefined\n"));
        assert!(got.contains("99 percentile latency is undefined\n"));
        assert!(!got.contains("NaN"));
    }

    #[test]
    fn requested_percentile_is_added_to_global_lines() {
        let report = reduce_reader(
            Cursor::new(b"meet deadline fib 10\nmeet deadline fib 20\n".as_slice()),
            Path::new("t.log"),
            &ReduceOptions {
                percentile: 50.0,
                ..ReduceOptions::default()
            },
        )
        .unwrap();
        let got = render_report(&report);
        assert!(got.contains("fib 50 percentile latency is 15.00\n"));
        assert!(got.contains("\n50 percentile latency is 15.00\n"));
    }

    #[test]
    fn threaded_profile_counts_outcomes_per_thread() {
        let report = reduce_reader(
            Cursor::new(b"3 req 1 meet deadline fib 10 5 1\n4 req 2 meet deadline fib 20 5 1\n3 req 3 meet deadline fib 30 5 1\n".as_slice()),
            Path::new("t.log"),
            &ReduceOptions {
                profile: crate::logline::FormatProfile::Threaded,
                ..ReduceOptions::default()
            },
        )
        .unwrap();
        let got = render_report(&report);
        assert!(got.contains("\nthread 3 outcomes: 2\nthread 4 outcomes: 1\n"));
        assert!(got.contains("function times: fib 20.00 5.00 30\n"));
    }
}
