//! Error types for vl-sql
//!
//! The `Display` text of each variant is what callers see in the `error`
//! field of a failed analysis, so the prefixes are part of the contract.

use thiserror::Error;

/// SQL parsing and lineage analysis errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SqlError {
    /// DDL text is not valid SQL under the configured dialect
    #[error("Analysis failed: {message}")]
    ParseError {
        message: String,
        line: usize,
        column: usize,
    },

    /// Empty SQL
    #[error("Analysis failed: SQL is empty")]
    EmptySql,

    /// Dialect name not recognized
    #[error("Analysis failed: unknown SQL dialect '{0}'")]
    UnknownDialect(String),

    /// Top-level statement is not a CREATE VIEW / CREATE TABLE
    #[error("Unsupported DDL type: {0}")]
    UnsupportedStatement(String),

    /// Resolution could not continue (e.g. IDENTIFIER() without a literal)
    #[error("Analysis failed: {0}")]
    Resolution(String),
}

impl SqlError {
    /// Whether the failure happened before a syntax tree existed
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, SqlError::ParseError { .. } | SqlError::EmptySql)
    }
}

/// Result type alias for SqlError
pub type SqlResult<T> = Result<T, SqlError>;
