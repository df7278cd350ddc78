//! Re-reading a reducer's textual report into structured values.
//!
//! The report is the only channel from a reduction back to the scanner; the
//! expressions below mirror the line shapes printed by `render::text`.

use crate::render::UNDEFINED;

use regex::Regex;
use std::collections::BTreeMap;

const GLOBAL_LATENCY_RE: &str = r"^(\d+(?:\.\d+)?) percentile latency is (\S+)$";
const GLOBAL_SLOWDOWN_RE: &str = r"^(\d+(?:\.\d+)?) percentile slow down is (\S+)$";
const MISS_RATE_RE: &str = r"^miss deadline percentage: (\S+)$";
const TYPE_MISS_RATE_RE: &str =
    r"^(\S+) miss deadline rate:(\S+) miss count is (\d+) total request (\d+)$";
const FUNCTION_TIMES_RE: &str = r"^function times: (\S+) (\S+) (\S+) (\d+)$";
const SCHEDULING_RE: &str = r"^scheduling counter: (\S+)$";
const THROUGHPUT_RE: &str = r"^throughput: (\S+)$";

/// Parsed fields of one reduction. `None` means the report printed `undefined`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExperimentResult {
    /// Keyed by the percentile exactly as printed (`"99.9"`).
    pub latency: BTreeMap<String, Option<f64>>,
    pub slow_down: BTreeMap<String, Option<f64>>,
    pub miss_rate: Option<f64>,
    pub type_miss_rate: BTreeMap<String, Option<f64>>,
    pub type_mean_latency: BTreeMap<String, Option<f64>>,
    pub type_mean_exec: BTreeMap<String, Option<f64>>,
    pub scheduling_peak: Option<u64>,
    pub throughput: Option<f64>,
}

fn value<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s == UNDEFINED { None } else { s.parse().ok() }
}

pub struct SummaryParser {
    global_latency: Regex,
    global_slowdown: Regex,
    miss_rate: Regex,
    type_miss_rate: Regex,
    function_times: Regex,
    scheduling: Regex,
    throughput: Regex,
}

impl SummaryParser {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self {
            global_latency: Regex::new(GLOBAL_LATENCY_RE)?,
            global_slowdown: Regex::new(GLOBAL_SLOWDOWN_RE)?,
            miss_rate: Regex::new(MISS_RATE_RE)?,
            type_miss_rate: Regex::new(TYPE_MISS_RATE_RE)?,
            function_times: Regex::new(FUNCTION_TIMES_RE)?,
            scheduling: Regex::new(SCHEDULING_RE)?,
            throughput: Regex::new(THROUGHPUT_RE)?,
        })
    }

    /// Lines that match none of the expressions are ignored.
    pub fn parse(&self, report: &str) -> ExperimentResult {
        let mut out = ExperimentResult::default();
        for line in report.lines().map(str::trim_end) {
            if let Some(c) = self.global_latency.captures(line) {
                out.latency.insert(c[1].to_string(), value(&c[2]));
            } else if let Some(c) = self.global_slowdown.captures(line) {
                out.slow_down.insert(c[1].to_string(), value(&c[2]));
            } else if let Some(c) = self.miss_rate.captures(line) {
                out.miss_rate = value(&c[1]);
            } else if let Some(c) = self.type_miss_rate.captures(line) {
                out.type_miss_rate.insert(c[1].to_string(), value(&c[2]));
            } else if let Some(c) = self.function_times.captures(line) {
                out.type_mean_latency.insert(c[1].to_string(), value(&c[2]));
                out.type_mean_exec.insert(c[1].to_string(), value(&c[3]));
            } else if let Some(c) = self.scheduling.captures(line) {
                out.scheduling_peak = value(&c[1]);
            } else if let Some(c) = self.throughput.captures(line) {
                out.throughput = value(&c[1]);
            }
        }
        out
    }
}
