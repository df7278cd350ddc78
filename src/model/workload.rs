//! Per-worker-thread workload curves.

use crate::logline::WorkloadSnapshotRecord;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadSample {
    pub timestamp_us: u64,
    pub workload: u64,
    pub realtime_workload: u64,
    pub realtime_request_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThreadWorkloadSeries {
    /// Log order.
    pub samples: Vec<WorkloadSample>,
    pub max_instantaneous: u64,
    pub max_realtime: u64,
}

#[derive(Debug, Default)]
pub struct WorkloadTracker {
    threads: BTreeMap<String, ThreadWorkloadSeries>,
    min_timestamp: Option<u64>,
}

impl WorkloadTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, record: &WorkloadSnapshotRecord) {
        let series = self.threads.entry(record.thread_id.clone()).or_default();
        series.samples.push(WorkloadSample {
            timestamp_us: record.timestamp_us,
            workload: record.instantaneous_workload,
            realtime_workload: record.realtime_workload,
            realtime_request_count: record.realtime_request_count,
        });
        series.max_instantaneous = series.max_instantaneous.max(record.instantaneous_workload);
        series.max_realtime = series.max_realtime.max(record.realtime_workload);

        self.min_timestamp = Some(
            self.min_timestamp
                .map_or(record.timestamp_us, |m| m.min(record.timestamp_us)),
        );
    }

    pub fn threads(&self) -> &BTreeMap<String, ThreadWorkloadSeries> {
        &self.threads
    }

    /// Earliest timestamp across every thread: the shared zero point.
    pub fn origin(&self) -> Option<u64> {
        self.min_timestamp
    }

    /// `thread -> [(relative_ts, workload)]` on the shared time axis.
    pub fn normalize(&self) -> BTreeMap<String, Vec<(u64, u64)>> {
        let origin = self.origin().unwrap_or(0);
        self.threads
            .iter()
            .map(|(tid, series)| {
                let points = series
                    .samples
                    .iter()
                    .map(|s| (s.timestamp_us - origin, s.workload))
                    .collect();
                (tid.clone(), points)
            })
            .collect()
    }

    /// `thread -> [(relative_ts, realtime_workload, realtime_request_count)]`.
    pub fn normalize_realtime(&self) -> BTreeMap<String, Vec<(u64, u64, u64)>> {
        let origin = self.origin().unwrap_or(0);
        self.threads
            .iter()
            .map(|(tid, series)| {
                let points = series
                    .samples
                    .iter()
                    .map(|s| {
                        (
                            s.timestamp_us - origin,
                            s.realtime_workload,
                            s.realtime_request_count,
                        )
                    })
                    .collect();
                (tid.clone(), points)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn snap(ts: u64, tid: &str, inst: u64, rt: u64) -> WorkloadSnapshotRecord {
        WorkloadSnapshotRecord {
            timestamp_us: ts,
            thread_id: tid.to_string(),
            instantaneous_workload: inst,
            realtime_workload: rt,
            realtime_request_count: 1,
        }
    }

    #[test]
    fn maxima_never_decrease() {
        let mut t = WorkloadTracker::new();
        t.observe(&snap(10, "1", 50, 7));
        t.observe(&snap(20, "1", 5, 9));
        let s = &t.threads()["1"];
        assert_eq!(s.max_instantaneous, 50);
        assert_eq!(s.max_realtime, 9);
    }

    #[test]
    fn threads_share_one_time_axis() {
        let mut t = WorkloadTracker::new();
        t.observe(&snap(1_000, "1", 3, 0));
        t.observe(&snap(400, "2", 4, 0));
        t.observe(&snap(1_200, "2", 8, 0));

        let norm = t.normalize();
        assert_eq!(norm["1"], vec![(600, 3)]);
        assert_eq!(norm["2"], vec![(0, 4), (800, 8)]);
        assert_eq!(t.origin(), Some(400));
    }

    proptest! {
        #[test]
        fn normalized_minimum_is_zero(
            snaps in prop::collection::vec((0u64..1_000_000_000, 0u8..8, 0u64..100), 1..100),
        ) {
            let mut t = WorkloadTracker::new();
            for (ts, tid, w) in &snaps {
                t.observe(&snap(*ts, &tid.to_string(), *w, 0));
            }
            let min = t
                .normalize()
                .values()
                .flat_map(|pts| pts.iter().map(|(ts, _)| *ts))
                .min();
            prop_assert_eq!(min, Some(0));
        }
    }
}
