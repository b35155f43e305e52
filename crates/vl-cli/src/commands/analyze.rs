//! `vl analyze` command: extract column lineage from DDL files

use anyhow::{bail, Result};
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use vl_sql::report::{
    error_row, error_row_with_message, rows_for, ANALYSIS_ERROR, DDL_NOT_FOUND, PROCESSING_ERROR,
    TIMEOUT,
};
use vl_sql::{LineageAnalyzer, LineageRow, RunSummary};

use super::common::{collect_inputs, DdlInput, ExitCode};
use super::output::render_rows;
use crate::cli::{AnalyzeArgs, GlobalArgs};
use crate::config::Config;

/// Execute the analyze command
pub(crate) async fn execute(args: &AnalyzeArgs, global: &GlobalArgs) -> Result<()> {
    let config = Config::resolve(global.config.as_deref())?.with_analyze_overrides(args)?;
    // Fail fast on a bad dialect instead of producing one error row per view
    LineageAnalyzer::new(&config.dialect)?;

    let inputs = collect_inputs(&args.paths, &config.extensions)?;
    if args.view_name.is_some() && inputs.len() > 1 {
        bail!("--view-name can only be used with a single input");
    }
    log::debug!(
        "Analyzing {} input(s) with dialect {} ({} jobs, {}ms timeout)",
        inputs.len(),
        config.dialect,
        config.jobs,
        config.timeout_ms
    );

    let rows = analyze_inputs(inputs, &config, args.view_name.as_deref()).await;

    let rendered = render_rows(&rows, config.output)?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", rendered)?;
    stdout.flush()?;

    let summary = RunSummary::from_rows(&rows);
    if args.summary {
        eprintln!("{}", summary);
    }
    if summary.has_errors() {
        return Err(ExitCode(1).into());
    }
    Ok(())
}

/// Analyze all inputs concurrently and return their rows in input order
///
/// At most `jobs` analyses run at once. A view that times out keeps its slot
/// until its blocking task actually returns.
pub(crate) async fn analyze_inputs(
    inputs: Vec<DdlInput>,
    config: &Config,
    view_name: Option<&str>,
) -> Vec<LineageRow> {
    let dialect: Arc<str> = Arc::from(config.dialect.as_str());
    let timeout = Duration::from_millis(config.timeout_ms);
    let jobs = config.jobs.max(1);
    let slots = Arc::new(Semaphore::new(jobs));
    let progress = progress_bar(inputs.len());

    let mut results: Vec<(usize, Vec<LineageRow>)> = stream::iter(inputs.into_iter().enumerate())
        .map(|(idx, input)| {
            let dialect = Arc::clone(&dialect);
            let slots = Arc::clone(&slots);
            let view_name = view_name.map(str::to_string);
            async move {
                let rows = analyze_input(input, dialect, slots, timeout, view_name).await;
                (idx, rows)
            }
        })
        .buffer_unordered(jobs)
        .inspect(|_| progress.inc(1))
        .collect()
        .await;

    progress.finish_and_clear();
    results.sort_by_key(|(idx, _)| *idx);
    results.into_iter().flat_map(|(_, rows)| rows).collect()
}

fn progress_bar(len: usize) -> ProgressBar {
    if len < 2 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    pb
}

/// Result of work run in a concurrency slot
#[derive(Debug)]
pub(crate) enum SlotOutcome<T> {
    Finished(T),
    TimedOut,
    /// The task panicked or could not be scheduled
    Failed(String),
}

/// Run `work` on the blocking pool once a slot is free, bounded by `timeout`
///
/// The timeout starts once the slot is acquired. The slot is held until
/// `work` returns, even after the timeout has fired.
pub(crate) async fn run_in_slot<T, F>(
    slots: Arc<Semaphore>,
    timeout: Duration,
    work: F,
) -> SlotOutcome<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let permit = match slots.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => return SlotOutcome::Failed(e.to_string()),
    };
    let task = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        work()
    });

    match tokio::time::timeout(timeout, task).await {
        Err(_) => SlotOutcome::TimedOut,
        Ok(Err(join_error)) => SlotOutcome::Failed(join_error.to_string()),
        Ok(Ok(value)) => SlotOutcome::Finished(value),
    }
}

/// Analyze one input in a slot, bounded by `timeout`
async fn analyze_input(
    input: DdlInput,
    dialect: Arc<str>,
    slots: Arc<Semaphore>,
    timeout: Duration,
    view_name: Option<String>,
) -> Vec<LineageRow> {
    let fallback_name = view_name.clone().unwrap_or_else(|| input.name.clone());
    if input.sql.trim().is_empty() {
        log::warn!("No DDL found for {}", fallback_name);
        return vec![error_row(&fallback_name, DDL_NOT_FOUND)];
    }

    let sql = input.sql;
    let outcome = run_in_slot(slots, timeout, move || {
        LineageAnalyzer::new(&dialect).and_then(|analyzer| analyzer.analyze(&sql))
    })
    .await;

    match outcome {
        SlotOutcome::TimedOut => {
            log::warn!(
                "Analysis of {} exceeded {}ms",
                fallback_name,
                timeout.as_millis()
            );
            vec![error_row(&fallback_name, TIMEOUT)]
        }
        SlotOutcome::Failed(message) => {
            log::error!("Analysis of {} did not complete: {}", fallback_name, message);
            vec![error_row_with_message(
                &fallback_name,
                PROCESSING_ERROR,
                &message,
            )]
        }
        SlotOutcome::Finished(Err(e)) => {
            log::warn!("Analysis of {} failed: {}", fallback_name, e);
            vec![error_row_with_message(
                &fallback_name,
                ANALYSIS_ERROR,
                &e.to_string(),
            )]
        }
        SlotOutcome::Finished(Ok(analysis)) => {
            let name = match view_name {
                Some(name) => name,
                None if analysis.object_name.is_empty() => fallback_name,
                None => analysis.object_name.clone(),
            };
            let rows = rows_for(&name, &analysis);
            if rows.is_empty() {
                log::info!("{} produced no lineage rows", name);
            }
            rows
        }
    }
}

#[cfg(test)]
#[path = "analyze_test.rs"]
mod tests;
