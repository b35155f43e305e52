//! Rendering of lineage rows as table, CSV or JSON

use anyhow::{Context, Result};
use csv::WriterBuilder;
use vl_sql::LineageRow;

use super::common::format_table;
use crate::cli::OutputFormat;

/// Column headers of exported rows
pub(crate) const ROW_HEADERS: [&str; 7] = [
    "View_Name",
    "View_Column",
    "Column_Type",
    "Source_Table",
    "Source_Column",
    "Expression_Type",
    "Confidence_Score",
];

/// Render rows in the requested format
pub(crate) fn render_rows(rows: &[LineageRow], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(format_table(&ROW_HEADERS, &cells(rows))),
        OutputFormat::Csv => render_csv(rows),
        OutputFormat::Json => {
            serde_json::to_string_pretty(rows).context("Failed to serialize rows")
        }
    }
}

fn cells(rows: &[LineageRow]) -> Vec<Vec<String>> {
    rows.iter().map(row_cells).collect()
}

fn row_cells(row: &LineageRow) -> Vec<String> {
    vec![
        row.view_name.clone(),
        row.view_column.clone(),
        row.column_type.to_string(),
        row.source_table.clone(),
        row.source_column.clone(),
        row.expression_type_label().to_string(),
        format!("{:.1}", row.confidence),
    ]
}

fn render_csv(rows: &[LineageRow]) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .has_headers(true)
        .from_writer(Vec::new());
    writer
        .write_record(ROW_HEADERS)
        .context("Failed to write CSV header")?;
    for row in rows {
        writer
            .write_record(row_cells(row))
            .context("Failed to write CSV row")?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV output: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

#[cfg(test)]
#[path = "output_test.rs"]
mod tests;
