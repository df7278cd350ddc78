//! Per-request lifecycle reconstruction from segment timing rows.
//!
//! A request logs one row per scheduling quantum, so rows are first summed per
//! `(request_id, function_id)` and only then grouped by function: each request
//! contributes exactly one sample per phase to its function's distribution.

use crate::error::TraceError;
use crate::logline::SegmentTimingRecord;
use crate::model::stats;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Total,
    Running,
    Queuing,
    Runnable,
    Blocked,
    Initializing,
}

impl Phase {
    /// Report order.
    pub const ALL: [Phase; 6] = [
        Phase::Total,
        Phase::Running,
        Phase::Queuing,
        Phase::Runnable,
        Phase::Blocked,
        Phase::Initializing,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Phase::Total => "total",
            Phase::Running => "running",
            Phase::Queuing => "queuing",
            Phase::Runnable => "runnable",
            Phase::Blocked => "blocked",
            Phase::Initializing => "initializing",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PhaseSums {
    pub total: u64,
    pub queuing: u64,
    pub initializing: u64,
    pub runnable: u64,
    pub running: u64,
    pub blocked: u64,
    pub real_total: Option<u64>,
    pub segments: u32,
    /// Some phase sum hit `u64::MAX`; the request counts as inconsistent.
    #[serde(skip)]
    pub saturated: bool,
}

/// Add into `acc`, pinning it at `u64::MAX`. Returns whether it overflowed.
fn saturating_accumulate(acc: &mut u64, value: u64) -> bool {
    match acc.checked_add(value) {
        Some(sum) => {
            *acc = sum;
            false
        }
        None => {
            *acc = u64::MAX;
            true
        }
    }
}

impl PhaseSums {
    /// `total >= running + queuing + blocked + initializing` is expected of the
    /// runtime but not guaranteed.
    pub fn is_consistent(&self) -> bool {
        if self.saturated {
            return false;
        }
        let parts = u128::from(self.running)
            + u128::from(self.queuing)
            + u128::from(self.blocked)
            + u128::from(self.initializing);
        u128::from(self.total) >= parts
    }

    fn add(&mut self, rec: &SegmentTimingRecord) {
        let mut overflow = false;
        overflow |= saturating_accumulate(&mut self.total, rec.total_us);
        overflow |= saturating_accumulate(&mut self.queuing, rec.queuing_us);
        overflow |= saturating_accumulate(&mut self.initializing, rec.initializing_us);
        overflow |= saturating_accumulate(&mut self.runnable, rec.runnable_us);
        overflow |= saturating_accumulate(&mut self.running, rec.running_us);
        overflow |= saturating_accumulate(&mut self.blocked, rec.blocked_us);
        if let Some(real) = rec.real_total_us {
            overflow |= saturating_accumulate(self.real_total.get_or_insert(0), real);
        }
        self.saturated |= overflow;
        self.segments = self.segments.saturating_add(1);
    }
}

/// One row of the per-request lifecycle artifact.
#[derive(Debug, Clone, Serialize)]
pub struct LifecycleRow {
    pub request_id: String,
    pub function_id: String,
    #[serde(flatten)]
    pub sums: PhaseSums,
}

/// Per-function samples, one per request, for every phase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseDistributions {
    pub total: Vec<u64>,
    pub queuing: Vec<u64>,
    pub initializing: Vec<u64>,
    pub runnable: Vec<u64>,
    pub running: Vec<u64>,
    pub blocked: Vec<u64>,
}

impl PhaseDistributions {
    pub fn samples(&self, phase: Phase) -> &[u64] {
        match phase {
            Phase::Total => &self.total,
            Phase::Running => &self.running,
            Phase::Queuing => &self.queuing,
            Phase::Runnable => &self.runnable,
            Phase::Blocked => &self.blocked,
            Phase::Initializing => &self.initializing,
        }
    }

    pub fn median(&self, phase: Phase) -> Result<f64, TraceError> {
        stats::median_u64(self.samples(phase), phase.name())
    }

    pub fn mean(&self, phase: Phase) -> Result<f64, TraceError> {
        stats::mean_u64(self.samples(phase), phase.name())
    }

    fn push(&mut self, sums: &PhaseSums) {
        self.total.push(sums.total);
        self.queuing.push(sums.queuing);
        self.initializing.push(sums.initializing);
        self.runnable.push(sums.runnable);
        self.running.push(sums.running);
        self.blocked.push(sums.blocked);
    }
}

#[derive(Debug, Default)]
pub struct LifecycleReconstructor {
    requests: BTreeMap<(String, String), PhaseSums>,
}

impl LifecycleReconstructor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, record: &SegmentTimingRecord) {
        self.requests
            .entry((record.request_id.clone(), record.function_id.clone()))
            .or_default()
            .add(record);
    }

    #[cfg(test)]
    pub fn get(&self, request_id: &str, function_id: &str) -> Option<&PhaseSums> {
        self.requests
            .get(&(request_id.to_string(), function_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    /// Requests whose accumulated phases exceed their accumulated total.
    pub fn inconsistencies(&self) -> usize {
        self.requests.values().filter(|s| !s.is_consistent()).count()
    }

    pub fn regroup_by_function(&self) -> BTreeMap<String, PhaseDistributions> {
        let mut out: BTreeMap<String, PhaseDistributions> = BTreeMap::new();
        for ((_, function_id), sums) in &self.requests {
            out.entry(function_id.clone()).or_default().push(sums);
        }
        out
    }

    pub fn rows(&self) -> Vec<LifecycleRow> {
        self.requests
            .iter()
            .map(|((request_id, function_id), sums)| LifecycleRow {
                request_id: request_id.clone(),
                function_id: function_id.clone(),
                sums: *sums,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn seg(id: &str, func: &str, phases: [u64; 6]) -> SegmentTimingRecord {
        let [total, queuing, initializing, runnable, running, blocked] = phases;
        SegmentTimingRecord {
            request_id: id.to_string(),
            function_id: func.to_string(),
            total_us: total,
            queuing_us: queuing,
            initializing_us: initializing,
            runnable_us: runnable,
            running_us: running,
            blocked_us: blocked,
            real_total_us: None,
        }
    }

    #[test]
    fn segments_of_one_request_are_summed() {
        let mut lc = LifecycleReconstructor::new();
        lc.observe(&seg("42", "fn01", [100, 20, 5, 50, 10, 15]));
        lc.observe(&seg("42", "fn01", [30, 0, 0, 10, 20, 0]));
        lc.observe(&seg("43", "fn01", [10, 1, 1, 1, 1, 1]));

        let sums = lc.get("42", "fn01").unwrap();
        assert_eq!(sums.total, 130);
        assert_eq!(sums.running, 30);
        assert_eq!(sums.segments, 2);

        let by_fn = lc.regroup_by_function();
        assert_eq!(by_fn["fn01"].total, vec![130, 10]);
        assert_eq!(by_fn["fn01"].median(Phase::Total).unwrap(), 70.0);
    }

    #[test]
    fn same_request_id_different_function_is_distinct() {
        let mut lc = LifecycleReconstructor::new();
        lc.observe(&seg("1", "fn01", [10, 1, 1, 1, 1, 1]));
        lc.observe(&seg("1", "fn02", [20, 1, 1, 1, 1, 1]));
        assert_eq!(lc.len(), 2);
        assert_eq!(lc.regroup_by_function().len(), 2);
    }

    #[test]
    fn inconsistent_totals_are_counted_not_rejected() {
        let mut lc = LifecycleReconstructor::new();
        lc.observe(&seg("1", "fn01", [10, 20, 0, 0, 0, 0]));
        lc.observe(&seg("2", "fn01", [100, 20, 0, 0, 0, 0]));
        assert_eq!(lc.inconsistencies(), 1);
        assert_eq!(lc.len(), 2);
    }

    #[test]
    fn oversized_segment_values_saturate() {
        let mut lc = LifecycleReconstructor::new();
        let row = match crate::logline::classify(
            "x,42,fn01y,0,0,18446744073709551615,20,5,50,10,15",
            crate::logline::FormatProfile::Basic,
        ) {
            crate::logline::LogRecord::SegmentTiming(rec) => rec,
            other => panic!("expected segment, got {other:?}"),
        };
        lc.observe(&row);
        lc.observe(&row);
        lc.observe(&seg("43", "fn01", [100, 20, 5, 50, 10, 15]));

        let sums = lc.get("42", "fn01").unwrap();
        assert_eq!(sums.total, u64::MAX);
        assert_eq!(sums.queuing, 40);
        assert!(sums.saturated);
        assert_eq!(lc.inconsistencies(), 1);
        assert_eq!(lc.regroup_by_function()["fn01"].total, vec![u64::MAX, 100]);
    }

    proptest! {
        #[test]
        fn order_independent(
            rows in prop::collection::vec(
                (0u8..5, 0u8..3, prop::array::uniform6(0u64..10_000)),
                1..60,
            ),
            seed in any::<u64>(),
        ) {
            let records: Vec<SegmentTimingRecord> = rows
                .iter()
                .map(|(id, f, phases)| seg(&id.to_string(), &format!("fn0{f}"), *phases))
                .collect();

            let mut shuffled = records.clone();
            // Deterministic permutation driven by the seed.
            let n = shuffled.len();
            let mut state = seed;
            for i in (1..n).rev() {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let j = (state >> 33) as usize % (i + 1);
                shuffled.swap(i, j);
            }

            let mut a = LifecycleReconstructor::new();
            records.iter().for_each(|r| a.observe(r));
            let mut b = LifecycleReconstructor::new();
            shuffled.iter().for_each(|r| b.observe(r));

            prop_assert_eq!(a.requests, b.requests);
        }
    }
}
