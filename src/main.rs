//! Scenario metadata CLI
//!
//! Runs the metadata pipeline described by a TOML config file.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- --config metadata.toml --output output/meta.xlsx
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use scenmeta::config::PipelineConfig;
use scenmeta::pipeline;
use std::path::PathBuf;
use tracing::Level;

/// Add scenario metadata criteria to IAM output
#[derive(Parser, Debug)]
#[command(name = "scenmeta")]
#[command(about = "Evaluate scenario criteria and export them as metadata")]
struct Args {
    /// Pipeline configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input CSV file (overrides the config)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output .xlsx or .csv file (overrides the config)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print debug logs
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            Level::DEBUG
        } else {
            Level::INFO
        })
        .init();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if args.input.is_some() {
        config.input = args.input;
    }
    if args.output.is_some() {
        config.output = args.output;
    }

    let annotated = pipeline::run(&config).context("running metadata pipeline")?;
    println!(
        "Wrote {} data rows and metadata for {} scenarios",
        annotated.data.len(),
        annotated.meta.len()
    );
    Ok(())
}
