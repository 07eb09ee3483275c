//! Check NESTML models
//!
//! Parses and analyzes each model file and prints its findings.
//!
//! Usage: `nestml-check [--collect-all] [--config <file.json>] <model.nestml>...`

use clap::Parser;
use nestml::{analyze_file, format_findings, load_config, AnalysisConfig};
use std::path::PathBuf;
use std::process;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "nestml-check")]
#[command(about = "Check NESTML models and report findings")]
struct Args {
    /// Model files to check
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// JSON analysis configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report every finding instead of stopping at the first error
    #[arg(long)]
    collect_all: bool,
}

fn main() {
    nestml::init_logging();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(err) => {
                error!("{}", err);
                process::exit(2);
            }
        },
        None => AnalysisConfig::default(),
    };
    if args.collect_all {
        config.fail_quick = false;
    }

    let mut failed = false;
    for file in &args.files {
        info!("Checking {}", file.display());
        match analyze_file(file, &config) {
            Ok(analysis) => {
                if !analysis.findings.is_empty() {
                    println!("{}", format_findings(&analysis.findings));
                }
                failed |= analysis.has_errors();
            }
            Err(err) => {
                if let Some(findings) = err.findings() {
                    println!("{}", format_findings(findings));
                }
                error!("{}", err);
                failed = true;
            }
        }
    }

    if failed {
        process::exit(1);
    }
}
