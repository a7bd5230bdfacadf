use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sizemon")]
#[command(about = "A sizing monitor for SIEM servers")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Collect a sample, append it to the history, and regenerate the report
    Run(RunArgs),

    /// Regenerate the report from the existing history without collecting
    Report(ReportArgs),

    /// Print the stored history as a table
    History(HistoryArgs),
}

#[derive(Parser)]
pub struct RunArgs {
    /// Config file path (defaults to the platform config dir, e.g. ~/.config/sizemon/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory for the history file, report, and run log
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Skip the agent-count query entirely
    #[arg(long, default_value_t = false)]
    pub no_agents: bool,

    /// Abort the run when the agent-count query fails instead of recording a blank field
    #[arg(long, default_value_t = false)]
    pub require_agents: bool,

    /// Show detailed output
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

#[derive(Parser)]
pub struct ReportArgs {
    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory for the report artifacts
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Show detailed output
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Config file path
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output directory holding the history file
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Only show the most recent N rows
    #[arg(long)]
    pub limit: Option<usize>,
}
