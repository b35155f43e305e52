//! Flattening of lineage analyses into result rows
//!
//! One row per output column, tagged with a column type whose confidence
//! score downstream consumers filter on.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::lineage::{ColumnRef, LineageAnalysis, ResolutionMethod};

/// Source table of a derived column that reads no column
pub const CALCULATED_TABLE: &str = "CALCULATED";

/// Source column of a derived column that reads no column
pub const LITERAL_COLUMN: &str = "LITERAL";

/// Error reason for a view whose DDL could not be obtained
pub const DDL_NOT_FOUND: &str = "DDL_NOT_FOUND";

/// Error reason for a view whose DDL failed analysis
pub const ANALYSIS_ERROR: &str = "ANALYSIS_ERROR";

/// Error reason for a view whose analysis panicked or was cancelled
pub const PROCESSING_ERROR: &str = "PROCESSING_ERROR";

/// Error reason for a view whose analysis exceeded its time limit
pub const TIMEOUT: &str = "TIMEOUT";

/// How an output column relates to its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    Direct,
    Derived,
    Unknown,
    Error,
}

impl ColumnType {
    /// Confidence score implied by the column type
    pub fn confidence(self) -> f64 {
        match self {
            ColumnType::Direct => 1.0,
            ColumnType::Derived => 0.8,
            ColumnType::Unknown => 0.5,
            ColumnType::Error => 0.0,
        }
    }

    /// Whether the column was traced to a source
    pub fn is_success(self) -> bool {
        matches!(self, ColumnType::Direct | ColumnType::Derived)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Direct => write!(f, "DIRECT"),
            ColumnType::Derived => write!(f, "DERIVED"),
            ColumnType::Unknown => write!(f, "UNKNOWN"),
            ColumnType::Error => write!(f, "ERROR"),
        }
    }
}

/// Expression tags recognized by consumers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExpressionType {
    Sum,
    Case,
    Coalesce,
    Concat,
    Window,
    Literal,
    CurrentTimestamp,
    Cast,
    Mul,
    Div,
    Add,
    Sub,
    GroupConcat,
    Count,
    Max,
    Min,
    Avg,
    DateDiff,
    Paren,
}

impl ExpressionType {
    /// All recognized tags
    pub const ALL: [ExpressionType; 19] = [
        ExpressionType::Sum,
        ExpressionType::Case,
        ExpressionType::Coalesce,
        ExpressionType::Concat,
        ExpressionType::Window,
        ExpressionType::Literal,
        ExpressionType::CurrentTimestamp,
        ExpressionType::Cast,
        ExpressionType::Mul,
        ExpressionType::Div,
        ExpressionType::Add,
        ExpressionType::Sub,
        ExpressionType::GroupConcat,
        ExpressionType::Count,
        ExpressionType::Max,
        ExpressionType::Min,
        ExpressionType::Avg,
        ExpressionType::DateDiff,
        ExpressionType::Paren,
    ];

    /// Tag as it appears in analyses and exports
    pub fn as_str(self) -> &'static str {
        match self {
            ExpressionType::Sum => "SUM",
            ExpressionType::Case => "CASE",
            ExpressionType::Coalesce => "COALESCE",
            ExpressionType::Concat => "CONCAT",
            ExpressionType::Window => "WINDOW",
            ExpressionType::Literal => "LITERAL",
            ExpressionType::CurrentTimestamp => "CURRENTTIMESTAMP",
            ExpressionType::Cast => "CAST",
            ExpressionType::Mul => "MUL",
            ExpressionType::Div => "DIV",
            ExpressionType::Add => "ADD",
            ExpressionType::Sub => "SUB",
            ExpressionType::GroupConcat => "GROUPCONCAT",
            ExpressionType::Count => "COUNT",
            ExpressionType::Max => "MAX",
            ExpressionType::Min => "MIN",
            ExpressionType::Avg => "AVG",
            ExpressionType::DateDiff => "DATEDIFF",
            ExpressionType::Paren => "PAREN",
        }
    }

    /// Parse a tag produced by the column resolver; unknown tags give `None`
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(tag))
    }
}

impl std::fmt::Display for ExpressionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra detail carried by a row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution_method: Option<ResolutionMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_sources: Vec<ColumnRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One output column of one view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineageRow {
    pub view_name: String,
    pub view_column: String,
    pub column_type: ColumnType,
    pub source_table: String,
    pub source_column: String,
    pub expression_type: Option<ExpressionType>,
    pub confidence: f64,
    #[serde(default)]
    pub metadata: RowMetadata,
}

impl LineageRow {
    /// Expression type as exported, empty when absent or unrecognized
    pub fn expression_type_label(&self) -> &'static str {
        self.expression_type.map(ExpressionType::as_str).unwrap_or("")
    }
}

/// Flatten an analysis into rows: direct mappings first, then derived ones
pub fn rows_for(view_name: &str, analysis: &LineageAnalysis) -> Vec<LineageRow> {
    let mut rows = Vec::with_capacity(analysis.column_mappings.len() + analysis.derived_columns.len());

    for (column, mapping) in &analysis.column_mappings {
        rows.push(LineageRow {
            view_name: view_name.to_string(),
            view_column: column.clone(),
            column_type: ColumnType::Direct,
            source_table: mapping.source_table.clone(),
            source_column: mapping.source_column.clone(),
            expression_type: None,
            confidence: ColumnType::Direct.confidence(),
            metadata: RowMetadata {
                table_alias: Some(mapping.table_alias.clone()),
                resolution_method: Some(mapping.resolution_method),
                ..Default::default()
            },
        });
    }

    for (column, derived) in &analysis.derived_columns {
        let expression_type = ExpressionType::from_tag(&derived.expression_type);
        let (column_type, source_table, source_column) = match derived.referenced_columns.first() {
            Some(primary) => (
                ColumnType::Derived,
                primary.table.clone(),
                primary.column.clone(),
            ),
            None => (
                ColumnType::Unknown,
                CALCULATED_TABLE.to_string(),
                LITERAL_COLUMN.to_string(),
            ),
        };
        rows.push(LineageRow {
            view_name: view_name.to_string(),
            view_column: column.clone(),
            column_type,
            source_table,
            source_column,
            expression_type,
            confidence: column_type.confidence(),
            metadata: RowMetadata {
                expression: Some(derived.expression.clone()),
                all_sources: derived.referenced_columns.clone(),
                ..Default::default()
            },
        });
    }

    rows
}

/// Single ERROR row standing in for a view that produced no lineage
pub fn error_row(view_name: &str, reason: &str) -> LineageRow {
    LineageRow {
        view_name: view_name.to_uppercase(),
        view_column: String::new(),
        column_type: ColumnType::Error,
        source_table: reason.to_string(),
        source_column: reason.to_string(),
        expression_type: None,
        confidence: ColumnType::Error.confidence(),
        metadata: RowMetadata::default(),
    }
}

/// Error row that also keeps the underlying message
pub fn error_row_with_message(view_name: &str, reason: &str, message: &str) -> LineageRow {
    let mut row = error_row(view_name, reason);
    row.metadata.error = Some(message.to_string());
    row
}

/// Aggregate statistics over a batch of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_views: usize,
    pub total_columns: usize,
    pub successful_columns: usize,
    pub error_columns: usize,
    /// Percentage of successful columns, rounded to one decimal
    pub success_rate: f64,
    pub column_types: IndexMap<ColumnType, usize>,
}

impl RunSummary {
    /// Summarize rows
    pub fn from_rows(rows: &[LineageRow]) -> Self {
        let views: IndexSet<&str> = rows.iter().map(|r| r.view_name.as_str()).collect();
        let mut column_types = IndexMap::new();
        for row in rows {
            *column_types.entry(row.column_type).or_insert(0) += 1;
        }
        let successful_columns = rows.iter().filter(|r| r.column_type.is_success()).count();
        let total_columns = rows.len();
        let success_rate = if total_columns == 0 {
            0.0
        } else {
            (successful_columns as f64 / total_columns as f64 * 1000.0).round() / 10.0
        };

        Self {
            total_views: views.len(),
            total_columns,
            successful_columns,
            error_columns: total_columns - successful_columns,
            success_rate,
            column_types,
        }
    }

    /// Whether any row is an ERROR row
    pub fn has_errors(&self) -> bool {
        self.column_types.contains_key(&ColumnType::Error)
    }
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Unique views processed: {}", self.total_views)?;
        writeln!(f, "  Total columns analyzed: {}", self.total_columns)?;
        writeln!(f, "  Column types:")?;
        for (column_type, count) in &self.column_types {
            writeln!(f, "    {column_type}: {count}")?;
        }
        write!(f, "  Success rate: {:.1}%", self.success_rate)
    }
}

#[cfg(test)]
#[path = "report_test.rs"]
mod tests;
