//! vl-sql - column-level lineage for SQL view definitions
//!
//! This crate parses a view's DDL with sqlparser-rs and resolves every
//! output column to the source table/column it reads, or to the expression
//! that computes it. Results can be flattened into rows with confidence
//! scores via [`report`].

pub mod aliases;
pub mod analyzer;
pub mod classify;
pub mod dialect;
pub mod error;
pub mod lineage;
pub mod parser;
pub mod pattern;
pub mod report;
pub mod wildcard;

pub use aliases::{resolve_aliases, TableAliases};
pub use analyzer::{analyze, analyze_statement, AnalysisOutcome, LineageAnalyzer};
pub use classify::{classify, DdlStructure, DdlType};
pub use dialect::{DuckDbDialect, GenericDialect, SnowflakeDialect, SqlDialect};
pub use error::{SqlError, SqlResult};
pub use lineage::{
    resolve_columns, ColumnRef, DerivedMapping, DirectMapping, LineageAnalysis, ResolutionMethod,
};
pub use parser::{SqlParser, DEFAULT_DIALECT};
pub use pattern::{detect_pattern, SqlPattern};
pub use report::{error_row, rows_for, ColumnType, ExpressionType, LineageRow, RunSummary};
pub use wildcard::{find_main_table, resolve_wildcards};

use sqlparser::ast::ObjectName;

/// Render a possibly qualified object name as `a.b.c`, without quotes
pub fn object_name_to_string(name: &ObjectName) -> String {
    name.0
        .iter()
        .map(|part| match part.as_ident() {
            Some(ident) => ident.value.clone(),
            None => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}
