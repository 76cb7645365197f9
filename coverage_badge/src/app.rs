use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::{
    badge::{write_badge, Badge},
    report::{extract_coverage, CounterKind},
};

pub const DEFAULT_REPORT_PATH: &str = "build/reports/jacoco/test/jacocoTestReport.xml";
pub const DEFAULT_OUTPUT_PATH: &str = "../badges/coverage.json";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "coverage_badge",
    author,
    version,
    about = "Generate a coverage badge from a JaCoCo XML report",
    long_about = None
)]
pub struct Args {
    /// JaCoCo XML report to read
    #[arg(long, value_name = "PATH", default_value = DEFAULT_REPORT_PATH)]
    pub report: PathBuf,

    /// Where to write the badge JSON
    #[arg(long, value_name = "PATH", default_value = DEFAULT_OUTPUT_PATH)]
    pub output: PathBuf,

    /// Counter type to report (INSTRUCTION, BRANCH, LINE, COMPLEXITY, METHOD, CLASS)
    #[arg(long, value_name = "KIND", default_value = "INSTRUCTION")]
    pub counter: CounterKind,

    /// Also print the badge JSON to stdout
    #[arg(long)]
    pub print: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub report: PathBuf,
    pub output: PathBuf,
    pub counter: CounterKind,
    pub print: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            report: PathBuf::from(DEFAULT_REPORT_PATH),
            output: PathBuf::from(DEFAULT_OUTPUT_PATH),
            counter: CounterKind::default(),
            print: false,
        }
    }
}

impl From<Args> for AppConfig {
    fn from(value: Args) -> Self {
        Self {
            report: value.report,
            output: value.output,
            counter: value.counter,
            print: value.print,
        }
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Extracts coverage from the report, then writes and returns the badge.
pub fn run(config: &AppConfig) -> Result<Badge> {
    let coverage = extract_coverage(&config.report, config.counter).with_context(|| {
        format!(
            "failed to extract coverage from {}",
            config.report.display()
        )
    })?;

    let badge = Badge::for_coverage(coverage);
    write_badge(&badge, &config.output)
        .with_context(|| format!("failed to write badge to {}", config.output.display()))?;

    if config.print {
        println!("{}", badge.to_json()?);
    }

    Ok(badge)
}
