//! Entry point. Exit codes: 0 = success, 1 = configuration error,
//! 2 = agent API error (only with --require-agents), 3 = I/O or render error.

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use sizemon::cli::{Cli, Command, HistoryArgs, ReportArgs, RunArgs};
use sizemon::config::Config;
use sizemon::error::Result;
use sizemon::store::HistoryStore;
use sizemon::util::{format_bytes, format_signed_bytes};
use sizemon::{collect, report};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(&args),
        Command::Report(args) => regenerate(&args),
        Command::History(args) => history(&args),
    };

    if let Err(e) = result {
        error!("{e}");
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

/// The cron entry point: collect, append, regenerate.
fn run(args: &RunArgs) -> Result<()> {
    let config = Config::from_run_args(args)?;
    init_logging(&config)?;

    let store = HistoryStore::new(config.history_path());
    let previous = store.last()?;

    let sample = collect::collect(&config, previous.as_ref())?;
    store.append(&sample)?;
    info!(
        "appended sample for {} (ingestion delta {})",
        sample.date,
        format_signed_bytes(sample.ingestion_delta)
    );

    let samples = store.read_all()?;
    report::generate(&samples, &config.output_dir)?;

    Ok(())
}

fn regenerate(args: &ReportArgs) -> Result<()> {
    let config = Config::from_report_args(args)?;
    init_logging(&config)?;

    let store = HistoryStore::new(config.history_path());
    let samples = store.read_all()?;
    report::generate(&samples, &config.output_dir)?;

    Ok(())
}

fn history(args: &HistoryArgs) -> Result<()> {
    let config = Config::from_history_args(args)?;
    let store = HistoryStore::new(config.history_path());
    let samples = store.read_all()?;

    if samples.is_empty() {
        println!("No history yet. Run 'sizemon run' to collect the first sample.");
        return Ok(());
    }

    let start = args
        .limit
        .map(|limit| samples.len().saturating_sub(limit))
        .unwrap_or(0);

    println!("{:<12} {:>12} {:>16} {:>8}", "Date", "/var", "Ingestion", "Agents");
    println!("{}", "-".repeat(52));
    for sample in &samples[start..] {
        let var = sample
            .var_bytes()
            .map(format_bytes)
            .unwrap_or_else(|| "-".to_string());
        let agents = sample
            .agent_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<12} {:>12} {:>16} {:>8}",
            sample.date.to_string(),
            var,
            format_signed_bytes(sample.ingestion_delta),
            agents
        );
    }

    Ok(())
}

/// Timestamped lines to stderr for interactive use, and appended to the run
/// log in the output directory so operators can audit cron history.
fn init_logging(config: &Config) -> Result<()> {
    std::fs::create_dir_all(&config.output_dir)?;
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())?;

    let default_level = if config.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(std::sync::Arc::new(log_file)),
        );

    // `report` may run after `run` in scripts that share a process; ignore a
    // second init rather than aborting
    let _ = registry.try_init();

    Ok(())
}
