//! CLI argument definitions using clap derive API

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// viewlineage - column-level lineage for SQL view definitions
#[derive(Parser, Debug)]
#[command(name = "vl")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all commands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (default: viewlineage.yml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract column lineage from DDL files and print one row per column
    Analyze(AnalyzeArgs),

    /// Print the raw lineage analysis of one DDL file as JSON
    Inspect(InspectArgs),
}

/// Arguments for the analyze command
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// DDL files, directories of DDL files, or `-` for stdin
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// SQL dialect (snowflake, duckdb, generic)
    #[arg(short, long)]
    pub dialect: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// View name to report when the DDL does not carry one (single input only)
    #[arg(long)]
    pub view_name: Option<String>,

    /// Maximum number of views analyzed concurrently
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Per-view time limit in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Print run statistics to stderr
    #[arg(long)]
    pub summary: bool,
}

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// DDL file, or `-` for stdin
    pub path: String,

    /// SQL dialect (snowflake, duckdb, generic)
    #[arg(short, long)]
    pub dialect: Option<String>,
}

/// Row output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned text table
    #[default]
    Table,
    /// CSV with a header row
    Csv,
    /// Pretty-printed JSON array
    Json,
}

#[cfg(test)]
#[path = "cli_test.rs"]
mod tests;
