//! Deadline outcome aggregation, keyed by request type.

use crate::error::TraceError;
use crate::logline::{Outcome, OutcomeRecord};
use crate::model::stats;
use std::collections::BTreeMap;

/// Everything observed for one request type. Created on the first record of
/// that type, read-only once the file is consumed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerTypeDistribution {
    pub count_meet: u64,
    pub count_miss: u64,
    /// Arrival order.
    pub latencies: Vec<u64>,
    pub max_latency: u64,
    pub delay_sum: u128,
    pub delays: Vec<u64>,
    pub exec_times: Vec<u64>,
    pub queue_times: Vec<u64>,
    /// `latency / exec_time` for records that carry a non-zero exec time.
    pub slowdowns: Vec<f64>,
}

impl PerTypeDistribution {
    pub fn total(&self) -> u64 {
        self.count_meet + self.count_miss
    }
}

#[derive(Debug, Default)]
pub struct DeadlineAggregator {
    types: BTreeMap<String, PerTypeDistribution>,
    /// Outcome records per worker thread, for profiles that log one.
    threads: BTreeMap<String, u64>,
    all_latencies: Vec<u64>,
    all_slowdowns: Vec<f64>,
}

impl DeadlineAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, record: &OutcomeRecord) {
        let dist = self
            .types
            .entry(record.request_type.clone())
            .or_default();

        match record.kind {
            Outcome::Meet => dist.count_meet += 1,
            Outcome::Miss => {
                dist.count_miss += 1;
                if let Some(delay) = record.delay_us {
                    dist.delay_sum += u128::from(delay);
                    dist.delays.push(delay);
                }
            }
        }

        if let Some(tid) = &record.thread_id {
            *self.threads.entry(tid.clone()).or_default() += 1;
        }

        let latency = record.total_latency_us;
        dist.latencies.push(latency);
        dist.max_latency = dist.max_latency.max(latency);
        self.all_latencies.push(latency);

        if let Some(exec) = record.exec_time_us {
            dist.exec_times.push(exec);
            if exec > 0 {
                let slowdown = latency as f64 / exec as f64;
                dist.slowdowns.push(slowdown);
                self.all_slowdowns.push(slowdown);
            }
        }
        if let Some(queue) = record.queue_time_us {
            dist.queue_times.push(queue);
        }
    }

    pub fn types(&self) -> &BTreeMap<String, PerTypeDistribution> {
        &self.types
    }

    pub fn outcomes_by_thread(&self) -> &BTreeMap<String, u64> {
        &self.threads
    }

    pub fn meet_count(&self) -> u64 {
        self.types.values().map(|d| d.count_meet).sum()
    }

    pub fn miss_count(&self) -> u64 {
        self.types.values().map(|d| d.count_miss).sum()
    }

    pub fn total_count(&self) -> u64 {
        self.meet_count() + self.miss_count()
    }

    /// `100 * total_miss / (total_miss + total_meet)`.
    pub fn miss_rate(&self) -> Result<f64, TraceError> {
        stats::percentage(self.miss_count(), self.total_count(), "miss deadline percentage")
    }

    fn dist(&self, request_type: &str) -> Result<&PerTypeDistribution, TraceError> {
        self.types
            .get(request_type)
            .ok_or_else(|| TraceError::insufficient_data(format!("request type {request_type}")))
    }

    pub fn type_miss_rate(&self, request_type: &str) -> Result<f64, TraceError> {
        let d = self.dist(request_type)?;
        stats::percentage(
            d.count_miss,
            d.total(),
            &format!("{request_type} miss deadline rate"),
        )
    }

    /// Share of all outcome records that belong to `request_type`.
    pub fn proportion(&self, request_type: &str) -> Result<f64, TraceError> {
        let d = self.dist(request_type)?;
        stats::percentage(
            d.total(),
            self.total_count(),
            &format!("{request_type} proportion"),
        )
    }

    pub fn percentile(&self, request_type: &str, p: f64) -> Result<f64, TraceError> {
        let d = self.dist(request_type)?;
        stats::percentile_u64(
            &d.latencies,
            p,
            &format!("{request_type} {p} percentile latency"),
        )
    }

    pub fn slowdown_percentile(&self, request_type: &str, p: f64) -> Result<f64, TraceError> {
        let d = self.dist(request_type)?;
        stats::percentile(
            &d.slowdowns,
            p,
            &format!("{request_type} {p} percentile slow down"),
        )
    }

    pub fn mean(&self, request_type: &str) -> Result<f64, TraceError> {
        let d = self.dist(request_type)?;
        stats::mean_u64(&d.latencies, &format!("{request_type} mean latency"))
    }

    pub fn max(&self, request_type: &str) -> Result<u64, TraceError> {
        let d = self.dist(request_type)?;
        if d.latencies.is_empty() {
            return Err(TraceError::insufficient_data(format!(
                "{request_type} max latency"
            )));
        }
        Ok(d.max_latency)
    }

    pub fn mean_exec_time(&self, request_type: &str) -> Result<f64, TraceError> {
        let d = self.dist(request_type)?;
        stats::mean_u64(&d.exec_times, &format!("{request_type} mean exec time"))
    }

    pub fn mean_delay(&self, request_type: &str) -> Result<f64, TraceError> {
        let d = self.dist(request_type)?;
        if d.delays.is_empty() {
            return Err(TraceError::insufficient_data(format!(
                "{request_type} mean delay"
            )));
        }
        Ok(d.delay_sum as f64 / d.delays.len() as f64)
    }

    /// Percentile over every type's latencies together.
    pub fn global_percentile(&self, p: f64) -> Result<f64, TraceError> {
        stats::percentile_u64(&self.all_latencies, p, &format!("{p} percentile latency"))
    }

    pub fn global_slowdown_percentile(&self, p: f64) -> Result<f64, TraceError> {
        stats::percentile(&self.all_slowdowns, p, &format!("{p} percentile slow down"))
    }
}
