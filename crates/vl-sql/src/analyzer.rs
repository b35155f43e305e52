//! Lineage analysis entry point
//!
//! Runs one DDL statement through parse, classification, pattern detection
//! and the resolution path for its pattern. Every call builds its state
//! from scratch, so analyzers can be used from any number of threads.

use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement;

use crate::aliases::resolve_aliases;
use crate::classify::{classify, DdlStructure, DdlType};
use crate::error::{SqlError, SqlResult};
use crate::lineage::{resolve_columns, DirectMapping, LineageAnalysis, ResolutionMethod};
use crate::parser::SqlParser;
use crate::pattern::{PatternSignals, SqlPattern};
use crate::wildcard::resolve_wildcards;

/// Analyzes DDL statements under one dialect
#[derive(Default)]
pub struct LineageAnalyzer {
    parser: SqlParser,
}

impl LineageAnalyzer {
    /// Create an analyzer for a dialect name (`snowflake`, `duckdb`, `generic`)
    pub fn new(dialect: &str) -> SqlResult<Self> {
        Ok(Self {
            parser: SqlParser::from_dialect_name(dialect)?,
        })
    }

    /// Create an analyzer around an existing parser
    pub fn with_parser(parser: SqlParser) -> Self {
        Self { parser }
    }

    /// Name of the dialect in use
    pub fn dialect_name(&self) -> &'static str {
        self.parser.dialect_name()
    }

    /// Analyze the first statement of `ddl`
    pub fn analyze(&self, ddl: &str) -> SqlResult<LineageAnalysis> {
        let statement = self.parser.parse_single(ddl)?;
        log::debug!("Parsed DDL with {} dialect", self.dialect_name());
        analyze_statement(&statement)
    }

    /// Analyze and fold failures into the serializable outcome
    pub fn outcome(&self, ddl: &str) -> AnalysisOutcome {
        self.analyze(ddl).into()
    }
}

/// Analyze one DDL string under the named dialect
pub fn analyze(ddl: &str, dialect: &str) -> SqlResult<LineageAnalysis> {
    LineageAnalyzer::new(dialect)?.analyze(ddl)
}

/// Analyze an already parsed statement
pub fn analyze_statement(statement: &Statement) -> SqlResult<LineageAnalysis> {
    let structure = classify(statement);
    if !structure.supported {
        return Err(SqlError::UnsupportedStatement(structure.kind));
    }
    log::debug!(
        "Classified {} {} with {} column(s)",
        structure.ddl_type,
        structure.object_name,
        structure.object_columns.len()
    );

    let mut analysis = LineageAnalysis::new(&structure);
    if structure.ddl_type == DdlType::CreateTable {
        return Ok(analysis);
    }

    let signals = PatternSignals::scan(statement);
    let pattern = signals.pattern();
    log::debug!(
        "Detected {} pattern (ctes={}, wildcards={}, aliases={})",
        pattern,
        signals.cte_count,
        signals.wildcard_count,
        signals.explicit_alias_count
    );

    match pattern {
        SqlPattern::IdentifierFunction => {
            resolve_identifier(&mut analysis, statement, &signals)?;
        }
        SqlPattern::WildcardDominant => {
            resolve_structure(&mut analysis, statement, &structure);
            resolve_fallback(&mut analysis, statement, ResolutionMethod::WildcardResolution);
        }
        SqlPattern::NestedCteDominant => {
            resolve_structure(&mut analysis, statement, &structure);
        }
        SqlPattern::Hybrid => {
            resolve_structure(&mut analysis, statement, &structure);
            resolve_fallback(&mut analysis, statement, ResolutionMethod::WildcardFallback);
        }
    }

    Ok(analysis)
}

/// Alias scope plus column lineage of every SELECT
fn resolve_structure(analysis: &mut LineageAnalysis, statement: &Statement, structure: &DdlStructure) {
    let aliases = resolve_aliases(statement, &structure.object_name);
    let resolved = resolve_columns(statement, &aliases, structure.positional_names.as_deref());
    analysis.absorb_aliases(&aliases);
    analysis.absorb_columns(resolved);
    log::debug!(
        "Resolved {} direct and {} derived column(s) of {}",
        analysis.column_mappings.len(),
        analysis.derived_columns.len(),
        analysis.object_name
    );
}

fn resolve_fallback(analysis: &mut LineageAnalysis, statement: &Statement, method: ResolutionMethod) {
    let aliases = resolve_aliases(statement, &analysis.object_name);
    resolve_wildcards(analysis, statement, &aliases, method);
}

/// Attribute every object column to the table named by `IDENTIFIER('...')`
fn resolve_identifier(
    analysis: &mut LineageAnalysis,
    statement: &Statement,
    signals: &PatternSignals,
) -> SqlResult<()> {
    let table = signals.identifier_target().ok_or_else(|| {
        SqlError::Resolution("could not extract IDENTIFIER table name".to_string())
    })?;

    let mut aliases = resolve_aliases(statement, &analysis.object_name);
    aliases.add_table(&table, None);
    analysis.absorb_aliases(&aliases);

    for column in analysis.object_columns.clone() {
        analysis.insert_direct(
            &column,
            DirectMapping::to_table(&table, &column, &table, ResolutionMethod::IdentifierResolution),
        );
    }
    log::debug!(
        "Resolved {} column(s) of {} through IDENTIFIER({})",
        analysis.object_columns.len(),
        analysis.object_name,
        table
    );
    Ok(())
}

/// Serialized form of an analysis: the full result or a single error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Success(Box<LineageAnalysis>),
    Failure { error: String },
}

impl AnalysisOutcome {
    /// Error message, if the analysis failed
    pub fn error(&self) -> Option<&str> {
        match self {
            AnalysisOutcome::Success(_) => None,
            AnalysisOutcome::Failure { error } => Some(error),
        }
    }

    /// The analysis, if it succeeded
    pub fn analysis(&self) -> Option<&LineageAnalysis> {
        match self {
            AnalysisOutcome::Success(analysis) => Some(analysis),
            AnalysisOutcome::Failure { .. } => None,
        }
    }
}

impl From<SqlResult<LineageAnalysis>> for AnalysisOutcome {
    fn from(result: SqlResult<LineageAnalysis>) -> Self {
        match result {
            Ok(analysis) => AnalysisOutcome::Success(Box::new(analysis)),
            Err(err) => AnalysisOutcome::Failure {
                error: err.to_string(),
            },
        }
    }
}

#[cfg(test)]
#[path = "analyzer_test.rs"]
mod tests;
