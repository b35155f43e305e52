//! Column-level lineage extraction from SQL AST
//!
//! This module holds the lineage model produced for one DDL statement and
//! the resolver that maps every projected column of the defining SELECTs
//! to either a direct source column or a derived expression.

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use sqlparser::ast::{
    visit_expressions, BinaryOperator, Expr, Function, FunctionArg, FunctionArgExpr,
    FunctionArguments, Query, Select, SelectItem, SetExpr, Statement, TableFactor,
};
use std::collections::HashSet;
use std::ops::ControlFlow;

use crate::aliases::{implicit_alias, TableAliases};
use crate::classify::{projection_output_name, statement_query, DdlStructure, DdlType};
use crate::object_name_to_string;

/// Source table recorded when a column's table cannot be determined
pub const UNKNOWN_TABLE: &str = "UNKNOWN";

/// How a direct mapping was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionMethod {
    /// Explicit column reference in a projection
    #[default]
    Direct,
    /// Mapped to the main table because the statement is wildcard-only
    WildcardResolution,
    /// Mapped to the main table to patch columns left after structural resolution
    WildcardFallback,
    /// Mapped to the table named by a dynamic identifier call
    IdentifierResolution,
}

impl std::fmt::Display for ResolutionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionMethod::Direct => write!(f, "direct"),
            ResolutionMethod::WildcardResolution => write!(f, "wildcard_resolution"),
            ResolutionMethod::WildcardFallback => write!(f, "wildcard_fallback"),
            ResolutionMethod::IdentifierResolution => write!(f, "identifier_resolution"),
        }
    }
}

/// Represents a column reference with its resolved source table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnRef {
    /// Resolved table name, `CTE_<name>`, or `UNKNOWN`
    pub table: String,
    /// Column name
    pub column: String,
    /// Qualifier as written in the SQL (empty when unqualified)
    pub alias: String,
}

impl ColumnRef {
    /// Create a new column reference
    pub fn new(table: &str, column: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            column: column.to_string(),
            alias: alias.to_string(),
        }
    }
}

impl std::fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// An output column that maps 1:1 onto a source column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectMapping {
    pub source_table: String,
    pub source_column: String,
    pub table_alias: String,
    #[serde(default)]
    pub resolution_method: ResolutionMethod,
}

impl DirectMapping {
    /// Mapping for an explicit column reference
    pub fn direct(source: ColumnRef) -> Self {
        Self {
            source_table: source.table,
            source_column: source.column,
            table_alias: source.alias,
            resolution_method: ResolutionMethod::Direct,
        }
    }

    /// Mapping for a column attributed to a whole table
    pub fn to_table(
        table: &str,
        column: &str,
        table_alias: &str,
        resolution_method: ResolutionMethod,
    ) -> Self {
        Self {
            source_table: table.to_string(),
            source_column: column.to_string(),
            table_alias: table_alias.to_string(),
            resolution_method,
        }
    }
}

/// An output column computed from an expression
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedMapping {
    /// Rendered expression text
    pub expression: String,
    /// Operator/function tag (SUM, CASE, ...) or the raw node kind
    pub expression_type: String,
    /// Columns read by the expression, in order of appearance
    pub referenced_columns: Vec<ColumnRef>,
}

impl DerivedMapping {
    /// Whether the expression reads no column (literal or argument-less call)
    pub fn is_literal(&self) -> bool {
        self.referenced_columns.is_empty()
    }
}

/// Complete lineage of one DDL statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageAnalysis {
    pub ddl_type: DdlType,
    pub object_name: String,
    pub object_columns: Vec<String>,
    pub source_tables: IndexSet<String>,
    pub column_mappings: IndexMap<String, DirectMapping>,
    pub derived_columns: IndexMap<String, DerivedMapping>,
    pub cte_definitions: IndexMap<String, String>,
    pub table_aliases: IndexMap<String, String>,
}

impl LineageAnalysis {
    /// Create an empty analysis for a classified statement
    pub fn new(structure: &DdlStructure) -> Self {
        Self {
            ddl_type: structure.ddl_type,
            object_name: structure.object_name.clone(),
            object_columns: structure.object_columns.clone(),
            source_tables: IndexSet::new(),
            column_mappings: IndexMap::new(),
            derived_columns: IndexMap::new(),
            cte_definitions: IndexMap::new(),
            table_aliases: IndexMap::new(),
        }
    }

    /// Record a direct mapping, replacing any derived entry of the same name
    pub fn insert_direct(&mut self, column: &str, mapping: DirectMapping) {
        self.derived_columns.shift_remove(column);
        self.column_mappings.insert(column.to_string(), mapping);
    }

    /// Record a derived mapping, replacing any direct entry of the same name
    pub fn insert_derived(&mut self, column: &str, mapping: DerivedMapping) {
        self.column_mappings.shift_remove(column);
        self.derived_columns.insert(column.to_string(), mapping);
    }

    /// Take over the alias scope of the statement
    pub fn absorb_aliases(&mut self, aliases: &TableAliases) {
        self.table_aliases.extend(
            aliases
                .table_aliases
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        self.source_tables
            .extend(aliases.source_tables.iter().cloned());
        self.cte_definitions.extend(
            aliases
                .cte_definitions
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    /// Apply resolved SELECT lineage in order, later entries winning
    pub fn absorb_columns(&mut self, resolved: ResolvedColumns) {
        for select in resolved.selects {
            for (name, column) in select.columns {
                match column {
                    ColumnLineage::Direct(mapping) => self.insert_direct(&name, mapping),
                    ColumnLineage::Derived(mapping) => self.insert_derived(&name, mapping),
                }
            }
        }
    }

    /// Object columns with neither a direct nor a derived mapping
    pub fn missing_columns(&self) -> Vec<String> {
        self.object_columns
            .iter()
            .filter(|c| !self.column_mappings.contains_key(*c) && !self.derived_columns.contains_key(*c))
            .cloned()
            .collect()
    }

    /// Get the direct mapping of an output column
    pub fn direct(&self, column: &str) -> Option<&DirectMapping> {
        self.column_mappings.get(column)
    }

    /// Get the derived mapping of an output column
    pub fn derived(&self, column: &str) -> Option<&DerivedMapping> {
        self.derived_columns.get(column)
    }
}

/// Lineage of one projected column
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnLineage {
    Direct(DirectMapping),
    Derived(DerivedMapping),
}

/// Lineage of every named projection of one SELECT, in projection order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectLineage {
    pub columns: Vec<(String, ColumnLineage)>,
}

/// Per-SELECT lineage of a statement, ordered so the outermost SELECT is last
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    pub selects: Vec<SelectLineage>,
}

/// Resolve the projections of the SELECTs that define a statement's output
///
/// Only CTE bodies and the statement's own query body contribute; subqueries
/// in FROM, WHERE or expressions do not. `outer_names` renames the outermost
/// projection positionally (declared view columns). CTE SELECTs come first
/// in the result so the SELECT that defines the object has the final say on
/// shared names.
pub fn resolve_columns(
    statement: &Statement,
    aliases: &TableAliases,
    outer_names: Option<&[String]>,
) -> ResolvedColumns {
    let mut resolved = ResolvedColumns::default();
    if let Some(query) = statement_query(statement) {
        collect_query(
            query,
            aliases,
            SelectRole::Outermost(outer_names),
            &mut resolved.selects,
        );
    }
    resolved
}

/// Position of a SELECT within the statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectRole<'a> {
    /// The SELECT that defines the object, with its declared column names
    Outermost(Option<&'a [String]>),
    /// A CTE body or a non-leading set operation branch
    Nested,
}

fn collect_query(
    query: &Query,
    aliases: &TableAliases,
    role: SelectRole<'_>,
    out: &mut Vec<SelectLineage>,
) {
    if let Some(with) = &query.with {
        for cte in &with.cte_tables {
            collect_query(&cte.query, aliases, SelectRole::Nested, out);
        }
    }

    let mut selects = Vec::new();
    body_selects(&query.body, &mut selects);
    // Leftmost SELECT last, so its names win over later set operation branches
    for (idx, select) in selects.into_iter().enumerate().rev() {
        let role = if idx == 0 { role } else { SelectRole::Nested };
        out.push(resolve_select(select, aliases, role));
    }
}

fn body_selects<'q>(body: &'q SetExpr, out: &mut Vec<&'q Select>) {
    match body {
        SetExpr::Select(select) => out.push(select),
        SetExpr::SetOperation { left, right, .. } => {
            body_selects(left, out);
            body_selects(right, out);
        }
        SetExpr::Query(query) => body_selects(&query.body, out),
        _ => {}
    }
}

/// Resolve the projection of a single SELECT
///
/// Only the outermost SELECT synthesizes names for unaliased expressions;
/// nested SELECTs skip such items.
pub fn resolve_select(select: &Select, aliases: &TableAliases, role: SelectRole<'_>) -> SelectLineage {
    let scope = SelectScope::new(select, aliases);
    let mut lineage = SelectLineage::default();
    let output_names = match role {
        SelectRole::Outermost(names) => names,
        SelectRole::Nested => None,
    };

    for (idx, item) in select.projection.iter().enumerate() {
        let name = match output_names.and_then(|names| names.get(idx)) {
            Some(name) => name.clone(),
            None => {
                let name = match role {
                    SelectRole::Outermost(_) => projection_output_name(item),
                    SelectRole::Nested => nested_output_name(item),
                };
                match name {
                    Some(name) => name,
                    None => continue,
                }
            }
        };
        let expr = match item {
            SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } => expr,
            SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => continue,
        };

        let column = match scope.column_ref(expr) {
            Some(source) => ColumnLineage::Direct(DirectMapping::direct(source)),
            None => ColumnLineage::Derived(scope.derived(expr)),
        };
        lineage.columns.push((name, column));
    }

    lineage
}

/// Alias or bare column name of a projection item
fn nested_output_name(item: &SelectItem) -> Option<String> {
    match item {
        SelectItem::ExprWithAlias { .. }
        | SelectItem::UnnamedExpr(Expr::Identifier(_) | Expr::CompoundIdentifier(_)) => {
            projection_output_name(item)
        }
        _ => None,
    }
}

/// Alias scope plus the single-table default of one SELECT
struct SelectScope<'a> {
    aliases: &'a TableAliases,
    /// (table, alias) unqualified columns belong to, when FROM has one table
    default_table: Option<(String, String)>,
}

impl<'a> SelectScope<'a> {
    fn new(select: &Select, aliases: &'a TableAliases) -> Self {
        Self {
            aliases,
            default_table: single_table(select, aliases),
        }
    }

    /// Resolve a bare or qualified column reference
    fn column_ref(&self, expr: &Expr) -> Option<ColumnRef> {
        let (qualifier, column) = match expr {
            Expr::Identifier(ident) => (None, ident.value.clone()),
            Expr::CompoundIdentifier(idents) => {
                let (last, prefix) = idents.split_last()?;
                let qualifier = (!prefix.is_empty()).then(|| {
                    prefix
                        .iter()
                        .map(|i| i.value.clone())
                        .collect::<Vec<_>>()
                        .join(".")
                });
                (qualifier, last.value.clone())
            }
            _ => return None,
        };

        Some(match qualifier {
            Some(qualifier) => {
                let table = self.aliases.resolve_or_raw(&qualifier);
                ColumnRef::new(&table, &column, &qualifier)
            }
            None => match &self.default_table {
                Some((table, alias)) => ColumnRef::new(table, &column, alias),
                None => ColumnRef::new(UNKNOWN_TABLE, &column, ""),
            },
        })
    }

    /// Collect every column read by an expression and tag its kind
    fn derived(&self, expr: &Expr) -> DerivedMapping {
        let skipped = date_part_arguments(expr);
        let mut seen = HashSet::new();
        let mut referenced_columns = Vec::new();

        let _ = visit_expressions(expr, |node| {
            let is_column = matches!(node, Expr::Identifier(_) | Expr::CompoundIdentifier(_));
            if is_column && !skipped.iter().any(|s| std::ptr::eq(*s, node)) {
                if let Some(column) = self.column_ref(node) {
                    if seen.insert(column.clone()) {
                        referenced_columns.push(column);
                    }
                }
            }
            ControlFlow::<()>::Continue(())
        });

        DerivedMapping {
            expression: expr.to_string(),
            expression_type: expression_type(expr),
            referenced_columns,
        }
    }
}

/// Table that unqualified columns of a SELECT belong to, if unambiguous
fn single_table(select: &Select, aliases: &TableAliases) -> Option<(String, String)> {
    let [from] = select.from.as_slice() else {
        return None;
    };
    if !from.joins.is_empty() {
        return None;
    }
    let TableFactor::Table {
        name, alias, args, ..
    } = &from.relation
    else {
        return None;
    };
    if args.is_some() {
        return None;
    }

    let table_name = object_name_to_string(name);
    let key = match alias {
        Some(alias) => alias.name.value.clone(),
        None => implicit_alias(&table_name),
    };
    let table = aliases.resolve(&key).unwrap_or(&table_name).to_string();
    let alias = alias
        .as_ref()
        .map(|a| a.name.value.clone())
        .unwrap_or_default();
    Some((table, alias))
}

/// Functions whose first argument is a date part keyword, not a column
const DATE_PART_FUNCTIONS: &[&str] = &[
    "DATEDIFF",
    "DATEADD",
    "TIMEDIFF",
    "TIMEADD",
    "TIMESTAMPDIFF",
    "TIMESTAMPADD",
    "DATE_TRUNC",
    "DATE_PART",
];

/// Bare-identifier date part arguments inside an expression
fn date_part_arguments(expr: &Expr) -> Vec<&Expr> {
    let mut skipped = Vec::new();
    collect_date_parts(expr, &mut skipped);
    skipped
}

fn collect_date_parts<'e>(expr: &'e Expr, skipped: &mut Vec<&'e Expr>) {
    // visit_expressions hands out short-lived borrows, so walk calls by hand
    match expr {
        Expr::Function(func) => {
            let FunctionArguments::List(list) = &func.args else {
                return;
            };
            let is_date_part_fn = DATE_PART_FUNCTIONS
                .iter()
                .any(|f| function_name(func).eq_ignore_ascii_case(f));
            for (idx, arg) in list.args.iter().enumerate() {
                let arg_expr = match arg {
                    FunctionArg::Unnamed(e)
                    | FunctionArg::Named { arg: e, .. }
                    | FunctionArg::ExprNamed { arg: e, .. } => e,
                };
                if let FunctionArgExpr::Expr(inner) = arg_expr {
                    if idx == 0 && is_date_part_fn && matches!(inner, Expr::Identifier(_)) {
                        skipped.push(inner);
                    } else {
                        collect_date_parts(inner, skipped);
                    }
                }
            }
        }
        Expr::Nested(inner) | Expr::UnaryOp { expr: inner, .. } => {
            collect_date_parts(inner, skipped)
        }
        Expr::Cast { expr: inner, .. } => collect_date_parts(inner, skipped),
        Expr::BinaryOp { left, right, .. } => {
            collect_date_parts(left, skipped);
            collect_date_parts(right, skipped);
        }
        Expr::Case {
            operand,
            conditions,
            else_result,
            ..
        } => {
            if let Some(op) = operand {
                collect_date_parts(op, skipped);
            }
            for case_when in conditions {
                collect_date_parts(&case_when.condition, skipped);
                collect_date_parts(&case_when.result, skipped);
            }
            if let Some(else_expr) = else_result {
                collect_date_parts(else_expr, skipped);
            }
        }
        _ => {}
    }
}

/// Last segment of a function name, upper-cased
fn function_name(func: &Function) -> String {
    func.name
        .0
        .last()
        .map(|part| match part.as_ident() {
            Some(ident) => ident.value.to_uppercase(),
            None => part.to_string().to_uppercase(),
        })
        .unwrap_or_default()
}

/// Tag an expression with its operator/function type
///
/// Common SQL functions and operators map onto a fixed vocabulary; anything
/// else keeps its raw name (function name or AST node kind).
pub fn expression_type(expr: &Expr) -> String {
    match expr {
        Expr::Function(func) => function_type(func),
        Expr::Case { .. } => "CASE".to_string(),
        Expr::Cast { .. } => "CAST".to_string(),
        Expr::Nested(_) => "PAREN".to_string(),
        Expr::Value(_) | Expr::TypedString { .. } => "LITERAL".to_string(),
        Expr::BinaryOp { op, .. } => match op {
            BinaryOperator::Plus => "ADD".to_string(),
            BinaryOperator::Minus => "SUB".to_string(),
            BinaryOperator::Multiply => "MUL".to_string(),
            BinaryOperator::Divide => "DIV".to_string(),
            BinaryOperator::StringConcat => "CONCAT".to_string(),
            _ => node_kind(expr),
        },
        other => node_kind(other),
    }
}

fn function_type(func: &Function) -> String {
    if func.over.is_some() {
        return "WINDOW".to_string();
    }
    let name = function_name(func);
    match name.as_str() {
        "CURRENT_TIMESTAMP" | "GETDATE" | "SYSDATE" | "NOW" | "SYSTIMESTAMP" => {
            "CURRENTTIMESTAMP".to_string()
        }
        "GROUP_CONCAT" | "LISTAGG" | "STRING_AGG" => "GROUPCONCAT".to_string(),
        "NVL" | "IFNULL" => "COALESCE".to_string(),
        "TRY_CAST" => "CAST".to_string(),
        "" => node_kind(&Expr::Function(func.clone())),
        _ => name,
    }
}

/// Variant name of an expression node, e.g. `UnaryOp` or `Extract`
fn node_kind(expr: &Expr) -> String {
    let debug = format!("{expr:?}");
    debug
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .next()
        .unwrap_or("Expr")
        .to_string()
}

#[cfg(test)]
#[path = "lineage_test.rs"]
mod tests;
