//! Scan configuration (scan.json).
//!
//! JSON shape (every field optional, command-line flags take precedence):
//! {
//!   "groups": ["EDF", "DARC"],     // subdirectories of the scan root
//!   "key": "rps",                  // substring a file name must contain
//!   "naming": "rps",               // rps | cores | concurrency | count | suffix
//!   "pattern": null,               // custom regex with a `param` capture
//!   "percentile": 99,
//!   "thresholds": [99, 99.9, 99.99],
//!   "profile": "basic",            // basic | threaded | verbose
//!   "sort": "ascending",
//!   "jobs": 4,
//!   "out": "tables",
//!   "reducer": null                // defaults to this executable
//! }

use crate::Result;
use crate::logline::FormatProfile;
use crate::reduce::DEFAULT_THRESHOLDS;
use crate::scan::naming::{FilenamePattern, Naming};
use crate::scan::walk::SortOrder;

use anyhow::{Context, bail};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawScanConfig {
    #[serde(default)]
    pub groups: Vec<String>,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub naming: Option<Naming>,

    #[serde(default)]
    pub pattern: Option<String>,

    #[serde(default)]
    pub percentile: Option<f64>,

    #[serde(default)]
    pub thresholds: Option<Vec<f64>>,

    #[serde(default)]
    pub profile: Option<FormatProfile>,

    #[serde(default)]
    pub sort: Option<SortOrder>,

    #[serde(default)]
    pub jobs: Option<usize>,

    #[serde(default)]
    pub out: Option<PathBuf>,

    #[serde(default)]
    pub reducer: Option<PathBuf>,
}

/// Scan settings with defaults filled in and every value checked.
#[derive(Debug, Clone)]
pub struct ValidatedScan {
    pub groups: Vec<String>,
    pub key: String,
    pub pattern: FilenamePattern,
    pub percentile: f64,
    pub thresholds: Vec<f64>,
    pub profile: FormatProfile,
    pub sort: SortOrder,
    pub jobs: usize,
    pub out: PathBuf,
    pub reducer: Option<PathBuf>,
}

fn check_percentile(p: f64, what: &str) -> Result<()> {
    if !(p > 0.0 && p <= 100.0) {
        bail!("{what} must be in (0, 100], got {p}");
    }
    Ok(())
}

impl RawScanConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read scan config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parse scan config {}", path.display()))
    }

    /// Layer `overrides` on top of `self`; set fields of `overrides` win.
    pub fn overlay(self, overrides: RawScanConfig) -> Self {
        Self {
            groups: if overrides.groups.is_empty() {
                self.groups
            } else {
                overrides.groups
            },
            key: overrides.key.or(self.key),
            naming: overrides.naming.or(self.naming),
            pattern: overrides.pattern.or(self.pattern),
            percentile: overrides.percentile.or(self.percentile),
            thresholds: overrides.thresholds.or(self.thresholds),
            profile: overrides.profile.or(self.profile),
            sort: overrides.sort.or(self.sort),
            jobs: overrides.jobs.or(self.jobs),
            out: overrides.out.or(self.out),
            reducer: overrides.reducer.or(self.reducer),
        }
    }

    pub fn validate_and_build(&self) -> Result<ValidatedScan> {
        let key = match self.key.as_deref() {
            Some(k) if !k.is_empty() => k.to_string(),
            _ => bail!("scan needs a non-empty filename key"),
        };

        let mut seen = std::collections::BTreeSet::new();
        for g in &self.groups {
            if g.is_empty() {
                bail!("empty group label");
            }
            if !seen.insert(g.as_str()) {
                bail!("duplicate group label: {g}");
            }
        }

        let percentile = self.percentile.unwrap_or(99.0);
        check_percentile(percentile, "percentile")?;
        let thresholds = self
            .thresholds
            .clone()
            .unwrap_or_else(|| DEFAULT_THRESHOLDS.to_vec());
        for t in &thresholds {
            check_percentile(*t, "threshold")?;
        }

        // A custom pattern replaces the named convention.
        let pattern = match &self.pattern {
            Some(re) => FilenamePattern::custom(re)?,
            None => FilenamePattern::builtin(self.naming.unwrap_or_default())?,
        };

        let jobs = match self.jobs {
            Some(0) => bail!("jobs must be at least 1"),
            Some(n) => n,
            None => std::thread::available_parallelism().map_or(1, |n| n.get()),
        };

        Ok(ValidatedScan {
            groups: self.groups.clone(),
            key,
            pattern,
            percentile,
            thresholds,
            profile: self.profile.unwrap_or_default(),
            sort: self.sort.unwrap_or_default(),
            jobs,
            out: self.out.clone().unwrap_or_else(|| PathBuf::from(".")),
            reducer: self.reducer.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw(json: &str) -> RawScanConfig {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn full_shape_validates() {
        let cfg = raw(r#"{
            "groups": ["EDF", "DARC"], "key": "rps", "naming": "rps",
            "pattern": null, "percentile": 99, "thresholds": [99, 99.9, 99.99],
            "profile": "threaded", "sort": "descending", "jobs": 4, "out": "tables"
        }"#)
        .validate_and_build()
        .unwrap();
        assert_eq!(cfg.groups, vec!["EDF", "DARC"]);
        assert_eq!(cfg.key, "rps");
        assert_eq!(cfg.profile, FormatProfile::Threaded);
        assert_eq!(cfg.sort, SortOrder::Descending);
        assert_eq!(cfg.jobs, 4);
        assert_eq!(cfg.out, PathBuf::from("tables"));
        assert_eq!(cfg.pattern.parse("EDF-50-rps.log").unwrap().param, 50);
    }

    #[test]
    fn defaults_fill_in() {
        let cfg = raw(r#"{"key": "x"}"#).validate_and_build().unwrap();
        assert_eq!(cfg.percentile, 99.0);
        assert_eq!(cfg.thresholds, DEFAULT_THRESHOLDS.to_vec());
        assert_eq!(cfg.profile, FormatProfile::Basic);
        assert_eq!(cfg.sort, SortOrder::Ascending);
        assert!(cfg.jobs >= 1);
    }

    #[test]
    fn rejects_bad_values() {
        for json in [
            r#"{}"#,
            r#"{"key": ""}"#,
            r#"{"key": "x", "percentile": 0}"#,
            r#"{"key": "x", "thresholds": [99, 101]}"#,
            r#"{"key": "x", "jobs": 0}"#,
            r#"{"key": "x", "pattern": "(\\d+)"}"#,
            r#"{"key": "x", "groups": ["a", "a"]}"#,
        ] {
            assert!(raw(json).validate_and_build().is_err(), "{json}");
        }
        assert!(serde_json::from_str::<RawScanConfig>(r#"{"key": "x", "bogus": 1}"#).is_err());
        assert!(serde_json::from_str::<RawScanConfig>(r#"{"naming": "weekly"}"#).is_err());
    }

    #[test]
    fn command_line_overrides_file() {
        let file = raw(r#"{"groups": ["EDF"], "key": "rps", "jobs": 2, "percentile": 90}"#);
        let cli = RawScanConfig {
            key: Some("load".to_string()),
            jobs: Some(8),
            ..RawScanConfig::default()
        };
        let merged = file.overlay(cli).validate_and_build().unwrap();
        assert_eq!(merged.key, "load");
        assert_eq!(merged.jobs, 8);
        assert_eq!(merged.percentile, 90.0);
        assert_eq!(merged.groups, vec!["EDF"]);
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        fs::write(&path, r#"{"key": "rps", "naming": "suffix"}"#).unwrap();
        let cfg = RawScanConfig::load(&path).unwrap();
        assert_eq!(cfg.naming, Some(Naming::Suffix));
        assert!(RawScanConfig::load(&dir.path().join("missing.json")).is_err());
    }
}
