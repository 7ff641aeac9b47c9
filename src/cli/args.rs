//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    area::AreaCommands,
    completions::CompletionsArgs,
    data::{ExportArgs, ImportArgs, ResetArgs},
    followup::FollowupCommands,
    init::InitArgs,
    problem::ProblemCommands,
    report::ReportCommands,
    roi::RoiCommands,
    track::TrackCommands,
};

#[derive(Parser)]
#[command(name = "remtrack")]
#[command(author, version, about = "Remediation catalog and tracking toolkit")]
#[command(
    long_about = "Tracks remediation areas and problems for a consulting engagement: edit the built-in catalog, add your own entries, and follow each problem's remediation progress and ROI."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Project root (default: auto-detect by finding .remtrack/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new remtrack project
    Init(InitArgs),

    /// Area management (catalog sections)
    #[command(subcommand)]
    Area(AreaCommands),

    /// Problem management
    #[command(subcommand)]
    Problem(ProblemCommands),

    /// Remediation tracking (status, progress, assignee, dates, cost)
    #[command(subcommand)]
    Track(TrackCommands),

    /// Follow-up timeline entries
    #[command(subcommand)]
    Followup(FollowupCommands),

    /// ROI analysis and saved scenarios
    #[command(subcommand)]
    Roi(RoiCommands),

    /// Reports over the resolved catalog
    #[command(subcommand)]
    Report(ReportCommands),

    /// Export all custom data as a versioned bundle
    Export(ExportArgs),

    /// Import a previously exported bundle (full replace)
    Import(ImportArgs),

    /// Discard all custom data and tracking state
    Reset(ResetArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Output format for list and show commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable tables
    Auto,
    /// JSON for scripting
    Json,
}
