//! Sleepwatch CLI - run one sleep-deviation EMA check
//!
//! Loads the configuration, runs the pipeline once over every configured
//! patient, and prints a per-patient report. Missing configuration is not
//! fatal (the run falls back to the bundled sample data); a corrupt
//! configuration file aborts the whole run.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use sleepwatch::pipeline::{EmaPipeline, PatientResult, RunOptions};
use sleepwatch::types::Thresholds;
use sleepwatch::{AppConfig, PipelineError, SLEEPWATCH_VERSION};

/// Sleepwatch - threshold-triggered sleep-deviation EMA pipeline
#[derive(Parser)]
#[command(name = "sleepwatch")]
#[command(version = SLEEPWATCH_VERSION)]
#[command(about = "Run one sleep-deviation EMA check", long_about = None)]
struct Cli {
    /// Path to config.json
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Simulate dispatch instead of hitting external survey APIs
    #[arg(long)]
    dry_run: bool,

    /// Percent deviation threshold
    #[arg(long, default_value_t = Thresholds::DEFAULT_DEVIATION_PCT)]
    deviation: f64,

    /// Minimum total sleep in hours
    #[arg(long, default_value_t = Thresholds::DEFAULT_MIN_HOURS)]
    min_hours: f64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let config = AppConfig::load(&cli.config)?;
    let options = RunOptions {
        dry_run: cli.dry_run,
        thresholds: Thresholds::new(cli.deviation, cli.min_hours),
    };

    let pipeline = EmaPipeline::new(config, options)?;
    let results = pipeline.run_once();

    print_report(&results, &options);
    Ok(())
}

fn print_report(results: &[PatientResult], options: &RunOptions) {
    println!("Sleepwatch Run Report");
    println!("=====================");
    println!(
        "Mode:       {}",
        if options.dry_run { "dry-run" } else { "live" }
    );
    println!(
        "Thresholds: deviation > {:.1}%, floor < {:.1} h",
        options.thresholds.deviation_pct, options.thresholds.min_hours
    );
    println!();

    for result in results {
        match &result.outcome {
            Ok(outcome) => println!("  {}: {}", result.patient_id, outcome),
            Err(error) => println!("  {}: error: {}", result.patient_id, error),
        }
    }

    let failed = results.iter().filter(|r| r.outcome.is_err()).count();
    if failed > 0 {
        println!();
        println!("{failed} of {} patients failed", results.len());
    }
}
