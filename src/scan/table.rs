//! Cross-experiment comparison tables: one row per group (or group and
//! request type), one cell per reduced file in the scan's sort order.

use crate::Result;
use crate::scan::summary::ExperimentResult;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One reduced file's value; `null` where the report said `undefined`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub param: u64,
    pub value: Value,
}

/// `row -> cells`. Cells keep the scan's order, and files sharing a
/// parameter each keep their own cell.
pub type Table = BTreeMap<String, Vec<Cell>>;

fn cell<T: Into<Value>>(v: Option<T>) -> Value {
    v.map_or(Value::Null, Into::into)
}

/// File stem of a per-threshold table: `99.9` -> `99_9_latency`.
pub fn threshold_table_name(threshold: f64, metric: &str) -> String {
    format!("{}_{metric}", threshold.to_string().replace('.', "_"))
}

#[derive(Debug, Clone, Default)]
pub struct ComparisonTable {
    /// Per group, results in report order (the scan's sort order).
    groups: BTreeMap<String, Vec<(u64, ExperimentResult)>>,
}

impl ComparisonTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `group` appear in the output even if none of its files reduce.
    pub fn ensure_group(&mut self, group: &str) {
        self.groups.entry(group.to_string()).or_default();
    }

    pub fn insert(&mut self, group: &str, param: u64, result: ExperimentResult) {
        self.groups
            .entry(group.to_string())
            .or_default()
            .push((param, result));
    }

    pub fn params(&self) -> BTreeMap<&str, Vec<u64>> {
        self.groups
            .iter()
            .map(|(g, rows)| (g.as_str(), rows.iter().map(|(p, _)| *p).collect()))
            .collect()
    }

    fn by_group(&self, f: impl Fn(&ExperimentResult) -> Value) -> Table {
        self.groups
            .iter()
            .map(|(g, rows)| {
                let cells: Vec<Cell> = rows
                    .iter()
                    .map(|(p, r)| Cell {
                        param: *p,
                        value: f(r),
                    })
                    .collect();
                (g.clone(), cells)
            })
            .collect()
    }

    fn by_group_and_type(
        &self,
        f: impl Fn(&ExperimentResult) -> &BTreeMap<String, Option<f64>>,
    ) -> Table {
        let mut out = Table::new();
        for (g, rows) in &self.groups {
            for (p, r) in rows {
                for (ty, v) in f(r) {
                    out.entry(format!("{g}_{ty}")).or_default().push(Cell {
                        param: *p,
                        value: cell(*v),
                    });
                }
            }
        }
        out
    }

    /// Every table, named by its artifact file stem, in output order.
    pub fn tables(&self, thresholds: &[f64]) -> Vec<(String, Table)> {
        let mut out = Vec::new();
        for &t in thresholds {
            let key = t.to_string();
            out.push((
                threshold_table_name(t, "latency"),
                self.by_group(|r| cell(r.latency.get(&key).copied().flatten())),
            ));
            out.push((
                threshold_table_name(t, "slow_down"),
                self.by_group(|r| cell(r.slow_down.get(&key).copied().flatten())),
            ));
        }
        out.push((
            "miss_deadline_rate".to_string(),
            self.by_group_and_type(|r| &r.type_miss_rate),
        ));
        out.push((
            "total_miss_deadline_rate".to_string(),
            self.by_group(|r| cell(r.miss_rate)),
        ));
        out.push((
            "total_latency".to_string(),
            self.by_group_and_type(|r| &r.type_mean_latency),
        ));
        out.push((
            "execution_time".to_string(),
            self.by_group_and_type(|r| &r.type_mean_exec),
        ));
        out.push((
            "preemption".to_string(),
            self.by_group(|r| cell(r.scheduling_peak)),
        ));
        out.push((
            "throughput".to_string(),
            self.by_group(|r| cell(r.throughput)),
        ));
        out
    }

    /// Plain-text rendition of `tables`, one block per table.
    pub fn render(&self, thresholds: &[f64]) -> String {
        let mut lines = Vec::new();
        for (name, table) in self.tables(thresholds) {
            lines.push(format!("[{name}]"));
            for (row, cols) in &table {
                let cells: Vec<String> = cols
                    .iter()
                    .map(|c| format!("{}={}", c.param, format_value(&c.value)))
                    .collect();
                lines.push(format!("{row}: {}", cells.join(" ")));
            }
        }
        let mut out = lines.join("\n");
        out.push('\n');
        out
    }

    /// Write every table plus `params.json` into `dir`.
    pub fn write(&self, dir: &Path, thresholds: &[f64]) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)
            .with_context(|| format!("create output directory {}", dir.display()))?;
        let mut written = Vec::new();
        for (name, table) in self.tables(thresholds) {
            written.push(write_json(dir, &format!("{name}.json"), &table)?);
        }
        written.push(write_json(dir, "params.json", &self.params())?);
        Ok(written)
    }
}

fn format_value(v: &Value) -> String {
    match v {
        Value::Null => crate::render::UNDEFINED.to_string(),
        Value::Number(n) => match (n.as_u64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            (None, Some(f)) => format!("{f:.2}"),
            _ => n.to_string(),
        },
        other => other.to_string(),
    }
}

fn write_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_string(value)?)
        .with_context(|| format!("write table {}", path.display()))?;
    Ok(path)
}
