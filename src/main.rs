//! Infographics - command line entry point

use anyhow::{Context, Result};
use clap::Parser;
use infographics::charts::PngRenderer;
use infographics::cli::{error_report, Args};
use infographics::config::StyleConfig;
use infographics::generator::InfographicsGenerator;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&args.log_level))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            eprintln!("{}", error_report(&err));
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let style = StyleConfig::load_or_default(args.style.as_deref())
        .context("Failed to load style configuration")?;

    let source = args
        .source()
        .context("Either --url or --csv must be given")?;
    let table = source
        .fetch()
        .with_context(|| format!("Could not load data from {}", source.describe()))?;

    let folder = args.output_folder();
    let renderer = PngRenderer::new(&table, &folder);
    let report = InfographicsGenerator::new(args.company.as_str(), &style)
        .run(&table, &renderer)
        .context("No infographics generated")?;

    for failure in &report.failures {
        warn!(
            "Skipped {} chart {}: {}",
            failure.archetype, failure.file_stem, failure.error
        );
    }
    info!(
        "Generated {}/{} charts in {}",
        report.saved.len(),
        report.attempted(),
        folder.display()
    );
    Ok(())
}
