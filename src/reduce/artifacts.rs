//! Serialized intermediate distributions written next to the textual report.
//!
//! File names are fixed; a second reduction in the same directory overwrites
//! the first. Every map is a `BTreeMap` so reruns are byte-identical.

use crate::Result;
use crate::reduce::Report;

use anyhow::Context;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const LATENCY_FILE: &str = "total_time.json";
pub const RUNNING_TIME_FILE: &str = "running_time.json";
pub const QUEUING_TIME_FILE: &str = "queuing_time.json";
pub const DELAY_FILE: &str = "delay.json";
pub const WORKLOAD_FILE: &str = "workload.json";
pub const REALTIME_WORKLOAD_FILE: &str = "realtime_workload.json";
pub const LIFECYCLE_FILE: &str = "lifecycle.json";

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_string(value)?;
    fs::write(&path, json).with_context(|| format!("write artifact {}", path.display()))?;
    Ok(path)
}

fn per_type<'a, F>(report: &'a Report, pick: F) -> BTreeMap<&'a str, &'a [u64]>
where
    F: Fn(&'a crate::model::outcome::PerTypeDistribution) -> &'a [u64],
{
    report
        .outcomes
        .types()
        .iter()
        .map(|(ty, dist)| (ty.as_str(), pick(dist)))
        .collect()
}

/// Write every artifact of `report` into `dir`, returning the paths written.
pub fn write_artifacts(report: &Report, dir: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create artifact directory {}", dir.display()))?;

    let written = vec![
        write_json(dir, LATENCY_FILE, &per_type(report, |d| d.latencies.as_slice()))?,
        write_json(dir, RUNNING_TIME_FILE, &per_type(report, |d| d.exec_times.as_slice()))?,
        write_json(dir, QUEUING_TIME_FILE, &per_type(report, |d| d.queue_times.as_slice()))?,
        write_json(dir, DELAY_FILE, &per_type(report, |d| d.delays.as_slice()))?,
        write_json(dir, WORKLOAD_FILE, &report.workload.normalize())?,
        write_json(
            dir,
            REALTIME_WORKLOAD_FILE,
            &report.workload.normalize_realtime(),
        )?,
        write_json(dir, LIFECYCLE_FILE, &report.lifecycle.rows())?,
    ];
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::{ReduceOptions, reduce_reader};
    use pretty_assertions::assert_eq;
    use std::io::Cursor;

    const LOG: &str = "\
3 req 1 meet deadline fib 12 9 2
3 req 2 miss deadline fib 40 9 20 7
4 req 3 meet deadline resize 300 250 5
100 3 total workload 5 2 1
40 4 total workload 9 3 1
0,42,fn01y,complete,0,100,20,5,50,10,15,0,120
";

    fn report() -> Report {
        let opts = ReduceOptions {
            profile: crate::logline::FormatProfile::Threaded,
            ..ReduceOptions::default()
        };
        reduce_reader(Cursor::new(LOG.as_bytes()), Path::new("t.log"), &opts).unwrap()
    }

    #[test]
    fn artifacts_have_expected_shape() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_artifacts(&report(), dir.path()).unwrap();
        assert_eq!(written.len(), 7);

        let latency = fs::read_to_string(dir.path().join(LATENCY_FILE)).unwrap();
        assert_eq!(latency, r#"{"fib":[12,40],"resize":[300]}"#);

        let delay = fs::read_to_string(dir.path().join(DELAY_FILE)).unwrap();
        assert_eq!(delay, r#"{"fib":[7],"resize":[]}"#);

        let workload = fs::read_to_string(dir.path().join(WORKLOAD_FILE)).unwrap();
        assert_eq!(workload, r#"{"3":[[60,5]],"4":[[0,9]]}"#);

        let lifecycle: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join(LIFECYCLE_FILE)).unwrap())
                .unwrap();
        assert_eq!(lifecycle[0]["function_id"], "fn01");
        assert_eq!(lifecycle[0]["queuing"], 20);
        assert_eq!(lifecycle[0]["real_total"], 120);
    }

    #[test]
    fn rerun_is_byte_identical() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        write_artifacts(&report(), a.path()).unwrap();
        write_artifacts(&report(), b.path()).unwrap();
        for name in [
            LATENCY_FILE,
            RUNNING_TIME_FILE,
            QUEUING_TIME_FILE,
            DELAY_FILE,
            WORKLOAD_FILE,
            REALTIME_WORKLOAD_FILE,
            LIFECYCLE_FILE,
        ] {
            assert_eq!(
                fs::read(a.path().join(name)).unwrap(),
                fs::read(b.path().join(name)).unwrap(),
                "{name}"
            );
        }
    }
}
