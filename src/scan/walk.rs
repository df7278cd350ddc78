use crate::Result;
use crate::scan::naming::FilenamePattern;

use anyhow::Context;
use clap::ValueEnum;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Group label used when neither `--group` nor the naming convention names one.
pub const DEFAULT_GROUP: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// One log file selected for reduction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub file_name: String,
    pub group: String,
    pub param: u64,
}

fn ensure_readable(dir: &Path) -> Result<()> {
    fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))?;
    Ok(())
}

fn walk_one(
    dir: &Path,
    label: Option<&str>,
    key: &str,
    pattern: &FilenamePattern,
    exclude: Option<&Path>,
    out: &mut BTreeMap<String, Vec<Candidate>>,
) {
    // Only directories named like the excluded one are resolved.
    let walker = WalkDir::new(dir).into_iter().filter_entry(|e| {
        let excluded = e.file_type().is_dir()
            && exclude.is_some_and(|x| {
                x.file_name() == Some(e.file_name())
                    && e.path().canonicalize().ok().as_deref() == Some(x)
            });
        !excluded
    });
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("{}: {e}", dir.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(file_name) = entry.file_name().to_str() else {
            continue;
        };
        if !file_name.contains(key) {
            continue;
        }
        let parsed = match pattern.parse(file_name) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("{e}");
                continue;
            }
        };
        let group = match label {
            Some(l) => l.to_string(),
            None => parsed.group.unwrap_or_else(|| DEFAULT_GROUP.to_string()),
        };
        out.entry(group.clone()).or_default().push(Candidate {
            path: entry.path().to_path_buf(),
            file_name: file_name.to_string(),
            group,
            param: parsed.param,
        });
    }
}

/// Find the files whose name contains `key`, grouped and sorted by parameter.
///
/// With `labels`, each label is a subdirectory of `root` and names its group;
/// otherwise `root` itself is walked. `exclude` prunes a directory (the
/// scanner's own output) from the walk. An unreadable `root` or label
/// directory is an error; everything below it only warns.
pub fn discover(
    root: &Path,
    labels: &[String],
    key: &str,
    pattern: &FilenamePattern,
    order: SortOrder,
    exclude: Option<&Path>,
) -> Result<BTreeMap<String, Vec<Candidate>>> {
    ensure_readable(root)?;
    let exclude = exclude.and_then(|p| p.canonicalize().ok());

    let mut out: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
    if labels.is_empty() {
        walk_one(root, None, key, pattern, exclude.as_deref(), &mut out);
    } else {
        for label in labels {
            let dir = root.join(label);
            ensure_readable(&dir)?;
            out.entry(label.clone()).or_default();
            walk_one(&dir, Some(label), key, pattern, exclude.as_deref(), &mut out);
        }
    }

    for files in out.values_mut() {
        files.sort_by(|a, b| {
            let by_param = match order {
                SortOrder::Ascending => a.param.cmp(&b.param),
                SortOrder::Descending => b.param.cmp(&a.param),
            };
            by_param.then_with(|| a.file_name.cmp(&b.file_name))
        });
    }
    Ok(out)
}
