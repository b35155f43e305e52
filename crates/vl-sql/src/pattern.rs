//! SQL pattern detection
//!
//! Scans a statement for structural signals and picks one of four
//! resolution strategies.

use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    Expr, FunctionArg, FunctionArgExpr, FunctionArguments, Query, SelectItem, SetExpr, Statement,
    TableFactor, Visit, Visitor,
};
use std::ops::ControlFlow;

/// Snowflake's dynamic identifier function
pub const IDENTIFIER_FUNCTION: &str = "IDENTIFIER";

/// Resolution strategy chosen for a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlPattern {
    /// A dynamic identifier call names the source table
    IdentifierFunction,
    /// Wildcards without CTEs
    WildcardDominant,
    /// CTEs without wildcards
    NestedCteDominant,
    /// CTEs with wildcards, or neither
    Hybrid,
}

impl std::fmt::Display for SqlPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlPattern::IdentifierFunction => write!(f, "identifier_function"),
            SqlPattern::WildcardDominant => write!(f, "wildcard_dominant"),
            SqlPattern::NestedCteDominant => write!(f, "nested_cte_dominant"),
            SqlPattern::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Structural signals counted across the whole statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternSignals {
    /// Rendered dynamic identifier calls, in visit order
    pub identifier_calls: Vec<String>,
    pub cte_count: usize,
    pub wildcard_count: usize,
    pub explicit_alias_count: usize,
}

impl PatternSignals {
    /// Count the signals of a statement
    pub fn scan(statement: &Statement) -> Self {
        let mut signals = Self::default();
        let _ = statement.visit(&mut signals);
        signals
    }

    /// Pick the resolution strategy, in precedence order
    pub fn pattern(&self) -> SqlPattern {
        if !self.identifier_calls.is_empty() {
            return SqlPattern::IdentifierFunction;
        }
        match (self.cte_count > 0, self.wildcard_count > 0) {
            (true, true) => SqlPattern::Hybrid,
            (true, false) => SqlPattern::NestedCteDominant,
            (false, true) => SqlPattern::WildcardDominant,
            (false, false) => SqlPattern::Hybrid,
        }
    }

    /// Table name passed to the first dynamic identifier call, if it is a literal
    pub fn identifier_target(&self) -> Option<String> {
        self.identifier_calls
            .first()
            .and_then(|call| identifier_literal(call))
    }
}

/// Detect the resolution strategy of a statement
pub fn detect_pattern(statement: &Statement) -> SqlPattern {
    PatternSignals::scan(statement).pattern()
}

impl Visitor for PatternSignals {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if let Some(with) = &query.with {
            self.cte_count += with.cte_tables.len();
        }
        self.count_projection(&query.body);
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<Self::Break> {
        if is_identifier_call(table_factor) {
            self.identifier_calls.push(table_factor.to_string());
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        let Expr::Function(func) = expr else {
            return ControlFlow::Continue(());
        };
        if func.name.to_string().eq_ignore_ascii_case(IDENTIFIER_FUNCTION) {
            self.identifier_calls.push(expr.to_string());
        }
        if let FunctionArguments::List(list) = &func.args {
            let wildcard_args = list
                .args
                .iter()
                .filter(|arg| {
                    matches!(
                        arg,
                        FunctionArg::Unnamed(
                            FunctionArgExpr::Wildcard | FunctionArgExpr::QualifiedWildcard(_)
                        )
                    )
                })
                .count();
            self.wildcard_count += wildcard_args;
        }
        ControlFlow::Continue(())
    }
}

impl PatternSignals {
    // Nested queries are visited on their own, so only SELECTs of this body count here
    fn count_projection(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Select(select) => {
                for item in &select.projection {
                    match item {
                        SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => {
                            self.wildcard_count += 1
                        }
                        SelectItem::ExprWithAlias { .. } => self.explicit_alias_count += 1,
                        SelectItem::UnnamedExpr(_) => {}
                    }
                }
            }
            SetExpr::SetOperation { left, right, .. } => {
                self.count_projection(left);
                self.count_projection(right);
            }
            _ => {}
        }
    }
}

/// Whether a table factor is an `IDENTIFIER('...')` call
///
/// The rendered form is checked so the test holds whether the parser keeps
/// the call as an object-name part or as a table function.
pub(crate) fn is_identifier_call(table_factor: &TableFactor) -> bool {
    let rendered = table_factor.to_string();
    let rendered = rendered.trim_start();
    let Some(head) = rendered.get(..IDENTIFIER_FUNCTION.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(IDENTIFIER_FUNCTION)
        && rendered[IDENTIFIER_FUNCTION.len()..]
            .trim_start()
            .starts_with('(')
}

/// First single-quoted literal inside a rendered call
pub fn identifier_literal(call: &str) -> Option<String> {
    let start = call.find('\'')? + 1;
    let len = call[start..].find('\'')?;
    let literal = call[start..start + len].trim();
    (!literal.is_empty()).then(|| literal.to_string())
}

#[cfg(test)]
#[path = "pattern_test.rs"]
mod tests;
