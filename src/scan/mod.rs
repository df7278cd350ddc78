//! Batch experiment scanner: discover log files, reduce each one in its own
//! subprocess, read the reports back and tabulate them per group and
//! parameter value.

pub mod naming;
pub mod run;
pub mod summary;
pub mod table;
pub mod walk;

pub use naming::Naming;
pub use walk::SortOrder;

use crate::Result;
use crate::config::ValidatedScan;
use run::ReducerCommand;
use summary::SummaryParser;
use table::ComparisonTable;

use std::path::Path;

/// Per-file reducer artifacts live under `<out>/artifacts/<group>/<file>/`.
pub const ARTIFACT_DIR: &str = "artifacts";

pub fn scan(root: &Path, cfg: &ValidatedScan) -> Result<ComparisonTable> {
    let artifact_root = cfg.out.join(ARTIFACT_DIR);
    let found = walk::discover(
        root,
        &cfg.groups,
        &cfg.key,
        &cfg.pattern,
        cfg.sort,
        Some(&artifact_root),
    )?;

    let reducer = ReducerCommand::from_config(cfg)?;
    let parser = SummaryParser::new()?;

    let mut table = ComparisonTable::new();
    for (group, files) in &found {
        table.ensure_group(group);
        log::info!("group {group}: {} file(s)", files.len());
        for reduced in run::run_all(&reducer, &parser, files, &artifact_root, cfg.jobs)? {
            table.insert(group, reduced.candidate.param, reduced.result);
        }
    }
    Ok(table)
}
