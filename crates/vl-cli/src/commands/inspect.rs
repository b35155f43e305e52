//! `vl inspect` command: print the raw lineage analysis of one DDL

use anyhow::{Context, Result};
use vl_sql::{AnalysisOutcome, LineageAnalyzer};

use super::common::{read_single, ExitCode};
use crate::cli::{GlobalArgs, InspectArgs};
use crate::config::Config;

/// Execute the inspect command
pub(crate) async fn execute(args: &InspectArgs, global: &GlobalArgs) -> Result<()> {
    let config = Config::resolve(global.config.as_deref())?;
    let dialect = args.dialect.as_deref().unwrap_or(&config.dialect);
    let analyzer = LineageAnalyzer::new(dialect)?;

    let input = read_single(&args.path)?;
    let outcome = inspect_sql(&analyzer, &input.sql);
    let json = serde_json::to_string_pretty(&outcome).context("Failed to serialize analysis")?;
    println!("{}", json);

    if outcome.error().is_some() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

/// Analyze one DDL into its serializable outcome
pub(crate) fn inspect_sql(analyzer: &LineageAnalyzer, sql: &str) -> AnalysisOutcome {
    let outcome = analyzer.outcome(sql);
    if let Some(error) = outcome.error() {
        log::warn!("{}", error);
    }
    outcome
}
