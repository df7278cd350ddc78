//! Experiment parameters encoded in log file names.
//!
//! Each convention is a regular expression with a `param` capture (digits) and
//! an optional `group` capture, matched against the bare file name.

use crate::error::TraceError;

use anyhow::{Context, bail};
use clap::ValueEnum;
use regex::Regex;
use serde::Deserialize;

/// `EDF-50-x.log`: requests per second in hyphen segment 1.
const RPS_RE: &str = r"^[^-]*-(?P<param>\d+)(?:[-.]|$)";
/// `srv-4-conc-32.log`: `<x>-<cores>-<y>-<concurrency>`.
const CORES_RE: &str = r"^[^-]*-(?P<param>\d+)-[^-]*-\d+(?:[-.]|$)";
const CONCURRENCY_RE: &str = r"^[^-]*-\d+-[^-]*-(?P<param>\d+)(?:[-.]|$)";
/// `12_funs.log`: leading underscore segment.
const COUNT_RE: &str = r"^(?P<param>\d+)_";
/// `edf_fib_x_80.log`: group from the first two segments, last numeric segment.
const SUFFIX_RE: &str = r"^(?P<group>[^_]+_[^_]+)_(?:.*_)?(?P<param>\d+)(?:\.[^_]*)?$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Naming {
    #[default]
    Rps,
    Cores,
    Concurrency,
    Count,
    Suffix,
}

impl Naming {
    fn source(self) -> (&'static str, char) {
        match self {
            Naming::Rps => (RPS_RE, '-'),
            Naming::Cores => (CORES_RE, '-'),
            Naming::Concurrency => (CONCURRENCY_RE, '-'),
            Naming::Count => (COUNT_RE, '_'),
            Naming::Suffix => (SUFFIX_RE, '_'),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub param: u64,
    pub group: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FilenamePattern {
    regex: Regex,
    /// Built-in conventions require at least two segments split on this.
    delimiter: Option<char>,
}

impl FilenamePattern {
    pub fn builtin(naming: Naming) -> anyhow::Result<Self> {
        let (source, delimiter) = naming.source();
        let regex = Regex::new(source).with_context(|| format!("naming convention {naming:?}"))?;
        Ok(Self {
            regex,
            delimiter: Some(delimiter),
        })
    }

    /// A user-supplied convention; must compile and name a `param` capture.
    pub fn custom(source: &str) -> anyhow::Result<Self> {
        let regex =
            Regex::new(source).with_context(|| format!("invalid filename pattern {source:?}"))?;
        if !regex.capture_names().any(|n| n == Some("param")) {
            bail!("filename pattern {source:?} has no `param` capture group");
        }
        Ok(Self {
            regex,
            delimiter: None,
        })
    }

    pub fn parse(&self, file_name: &str) -> Result<ParsedName, TraceError> {
        let skip = |reason: String| TraceError::FilenameParseSkip {
            file: file_name.to_string(),
            reason,
        };

        if let Some(d) = self.delimiter {
            if file_name.split(d).count() < 2 {
                return Err(skip(format!("fewer than 2 '{d}'-separated segments")));
            }
        }
        let caps = self
            .regex
            .captures(file_name)
            .ok_or_else(|| skip(format!("does not match /{}/", self.regex.as_str())))?;
        let raw = caps.name("param").map_or("", |m| m.as_str());
        let param = raw
            .parse::<u64>()
            .map_err(|_| skip(format!("parameter {raw:?} is not a number")))?;
        let group = caps.name("group").map(|m| m.as_str().to_string());
        Ok(ParsedName { param, group })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn param(naming: Naming, name: &str) -> Option<u64> {
        FilenamePattern::builtin(naming)
            .unwrap()
            .parse(name)
            .ok()
            .map(|p| p.param)
    }

    #[test]
    fn hyphen_conventions() {
        assert_eq!(param(Naming::Rps, "EDF-50-x.log"), Some(50));
        assert_eq!(param(Naming::Rps, "a-5.log"), Some(5));
        assert_eq!(param(Naming::Cores, "srv-4-conc-32.log"), Some(4));
        assert_eq!(param(Naming::Concurrency, "srv-4-conc-32.log"), Some(32));
        assert_eq!(param(Naming::Rps, "EDF-fast-x.log"), None);
    }

    #[test]
    fn underscore_conventions() {
        assert_eq!(param(Naming::Count, "12_funs.log"), Some(12));
        let parsed = FilenamePattern::builtin(Naming::Suffix)
            .unwrap()
            .parse("edf_fib_x_80.log")
            .unwrap();
        assert_eq!(
            parsed,
            ParsedName {
                param: 80,
                group: Some("edf_fib".to_string()),
            }
        );
    }

    #[test]
    fn too_few_segments_is_a_skip() {
        let err = FilenamePattern::builtin(Naming::Rps)
            .unwrap()
            .parse("server.log")
            .unwrap_err();
        assert!(matches!(err, TraceError::FilenameParseSkip { .. }));
        assert!(err.to_string().contains("fewer than 2"));
    }

    #[test]
    fn custom_pattern_needs_param() {
        assert!(FilenamePattern::custom(r"^(?P<load>\d+)").is_err());
        assert!(FilenamePattern::custom(r"^(?P<param>\d+").is_err());

        let p = FilenamePattern::custom(r"^run(?P<param>\d+)_(?P<group>\w+)\.log$").unwrap();
        assert_eq!(
            p.parse("run7_darc.log").unwrap(),
            ParsedName {
                param: 7,
                group: Some("darc".to_string()),
            }
        );
    }
}
