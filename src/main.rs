use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod config;
mod error;
mod logline;
mod model;
mod reduce;
mod render;
mod scan;

use logline::FormatProfile;
use scan::{Naming, SortOrder};

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "deadline-profile")]
#[command(about = "Deadline and latency reducer for real-time runtime traces", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reduce one trace log: print the report, write JSON artifacts.
    Reduce {
        #[arg(value_name = "LOG")]
        log_file: PathBuf,

        /// Percentile reported per request type.
        #[arg(default_value_t = 99.0, value_parser = percentile_arg)]
        percentile: f64,

        #[arg(long, value_enum, default_value_t = FormatProfile::Basic)]
        profile: FormatProfile,

        /// Percentile reported over all request types (repeatable).
        #[arg(long = "threshold", value_parser = percentile_arg)]
        thresholds: Vec<f64>,

        /// Fail on the first line that carries a marker but cannot be read.
        #[arg(long)]
        strict: bool,

        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Reduce every matching log under a directory and compare the results.
    Scan {
        root: PathBuf,

        /// Substring a file name must contain (may come from --config).
        key: Option<String>,

        #[arg(value_enum)]
        sort: Option<SortOrder>,

        /// Experiment group label: a subdirectory of ROOT (repeatable).
        #[arg(long = "group")]
        groups: Vec<String>,

        #[arg(long, value_enum)]
        naming: Option<Naming>,

        /// Custom file name regex with a `param` (and optional `group`) capture.
        #[arg(long)]
        pattern: Option<String>,

        #[arg(long, value_parser = percentile_arg)]
        percentile: Option<f64>,

        #[arg(long = "threshold", value_parser = percentile_arg)]
        thresholds: Vec<f64>,

        #[arg(long, value_enum)]
        profile: Option<FormatProfile>,

        #[arg(long)]
        jobs: Option<usize>,

        /// Reducer executable; defaults to this one.
        #[arg(long)]
        reducer: Option<PathBuf>,

        #[arg(long)]
        out: Option<PathBuf>,

        /// JSON scan configuration; flags override its values.
        #[arg(long = "config", value_name = "FILE")]
        config_file: Option<PathBuf>,
    },
}

fn percentile_arg(s: &str) -> std::result::Result<f64, String> {
    let p: f64 = s.parse().map_err(|e| format!("{s:?}: {e}"))?;
    if p > 0.0 && p <= 100.0 {
        Ok(p)
    } else {
        Err(format!("percentile must be in (0, 100], got {p}"))
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Reduce {
            log_file,
            percentile,
            profile,
            thresholds,
            strict,
            out_dir,
        } => {
            let mut opts = reduce::ReduceOptions {
                profile,
                percentile,
                strict,
                ..reduce::ReduceOptions::default()
            };
            if !thresholds.is_empty() {
                opts.thresholds = thresholds;
            }

            let report = reduce::reduce(&log_file, &opts)?;
            let written = reduce::write_artifacts(&report, &out_dir)?;
            log::info!(
                "{}: wrote {} artifacts to {}",
                report.source.display(),
                written.len(),
                out_dir.display()
            );
            print!("{}", render::render_report(&report));
        }

        Commands::Scan {
            root,
            key,
            sort,
            groups,
            naming,
            pattern,
            percentile,
            thresholds,
            profile,
            jobs,
            reducer,
            out,
            config_file,
        } => {
            let file = match &config_file {
                Some(path) => config::RawScanConfig::load(path)?,
                None => config::RawScanConfig::default(),
            };
            let flags = config::RawScanConfig {
                groups,
                key,
                naming,
                pattern,
                percentile,
                thresholds: (!thresholds.is_empty()).then_some(thresholds),
                profile,
                sort,
                jobs,
                out,
                reducer,
            };
            let cfg = file.overlay(flags).validate_and_build()?;

            let table = scan::scan(&root, &cfg)?;
            print!("{}", table.render(&cfg.thresholds));
            let written = table.write(&cfg.out, &cfg.thresholds)?;
            log::info!("wrote {} tables to {}", written.len(), cfg.out.display());
        }
    }

    Ok(())
}
