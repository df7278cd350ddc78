//! Per-file reductions as isolated subprocesses.
//!
//! Every reduction runs with its own artifact directory as working directory,
//! so reductions never overwrite each other's artifacts and can run in parallel.

use crate::Result;
use crate::config::ValidatedScan;
use crate::logline::FormatProfile;
use crate::scan::summary::{ExperimentResult, SummaryParser};
use crate::scan::walk::Candidate;

use anyhow::{Context, bail};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone)]
pub struct ReducerCommand {
    program: PathBuf,
    percentile: f64,
    thresholds: Vec<f64>,
    profile: FormatProfile,
}

impl ReducerCommand {
    /// Use `cfg.reducer`, or this executable when none is configured.
    pub fn from_config(cfg: &ValidatedScan) -> Result<Self> {
        let program = match &cfg.reducer {
            Some(p) => p.clone(),
            None => std::env::current_exe().context("locate reducer executable")?,
        };
        Ok(Self {
            program,
            percentile: cfg.percentile,
            thresholds: cfg.thresholds.clone(),
            profile: cfg.profile,
        })
    }

    /// Reduce `file` inside `workdir` and return the report it printed.
    pub fn run(&self, file: &Path, workdir: &Path) -> Result<String> {
        fs::create_dir_all(workdir)
            .with_context(|| format!("create artifact directory {}", workdir.display()))?;
        let file = file
            .canonicalize()
            .with_context(|| format!("resolve {}", file.display()))?;

        let mut cmd = Command::new(&self.program);
        cmd.arg("reduce")
            .arg(&file)
            .arg(self.percentile.to_string())
            .arg("--profile")
            .arg(self.profile.as_arg());
        for t in &self.thresholds {
            cmd.arg("--threshold").arg(t.to_string());
        }
        let output = cmd
            .current_dir(workdir)
            .output()
            .with_context(|| format!("spawn reducer {}", self.program.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("reducer exited with {}: {}", output.status, stderr.trim());
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[derive(Debug, Clone)]
pub struct Reduced {
    pub candidate: Candidate,
    pub result: ExperimentResult,
}

/// Reduce `files` on `jobs` threads, keeping their order. A file whose
/// reduction fails is logged and left out.
pub fn run_all(
    cmd: &ReducerCommand,
    parser: &SummaryParser,
    files: &[Candidate],
    artifact_root: &Path,
    jobs: usize,
) -> Result<Vec<Reduced>> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let reduced: Vec<Reduced> = pool.install(|| {
        files
            .par_iter()
            .filter_map(|c| {
                let workdir = artifact_root.join(&c.group).join(&c.file_name);
                match cmd.run(&c.path, &workdir) {
                    Ok(text) => {
                        log::info!("reduced {} ({} = {})", c.path.display(), c.group, c.param);
                        Some(Reduced {
                            candidate: c.clone(),
                            result: parser.parse(&text),
                        })
                    }
                    Err(e) => {
                        log::warn!("skipping {}: {e:#}", c.path.display());
                        None
                    }
                }
            })
            .collect()
    });
    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_reductions_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("EDF-5-x.log");
        fs::write(&log, "meet deadline fib 12\n").unwrap();
        let cmd = ReducerCommand {
            program: dir.path().join("no-such-reducer"),
            percentile: 99.0,
            thresholds: vec![99.0],
            profile: FormatProfile::Basic,
        };
        let files = vec![Candidate {
            path: log,
            file_name: "EDF-5-x.log".to_string(),
            group: "EDF".to_string(),
            param: 5,
        }];
        let parser = SummaryParser::new().unwrap();

        let reduced = run_all(&cmd, &parser, &files, &dir.path().join("artifacts"), 2).unwrap();
        assert!(reduced.is_empty());
        // The artifact directory is prepared before the spawn fails.
        assert!(dir.path().join("artifacts/EDF/EDF-5-x.log").is_dir());
    }
}
