//! DDL structure classification
//!
//! Determines what kind of object a statement creates, its name, and the
//! output columns it declares or projects.

use serde::{Deserialize, Serialize};
use sqlparser::ast::{Expr, Query, Select, SelectItem, SetExpr, Statement};

use crate::object_name_to_string;

/// Expressions whose rendered text is this long or longer get no column name
pub const EXPRESSION_NAME_LIMIT: usize = 50;

/// Kind of DDL statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DdlType {
    CreateView,
    CreateTable,
    CreateTableAsSelect,
    Unsupported,
}

impl std::fmt::Display for DdlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DdlType::CreateView => write!(f, "CREATE_VIEW"),
            DdlType::CreateTable => write!(f, "CREATE_TABLE"),
            DdlType::CreateTableAsSelect => write!(f, "CREATE_TABLE_AS_SELECT"),
            DdlType::Unsupported => write!(f, "UNSUPPORTED"),
        }
    }
}

/// Result of classifying a top-level statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DdlStructure {
    pub ddl_type: DdlType,
    /// Statement kind as shown to users, e.g. `CREATE VIEW` or `INSERT`
    pub kind: String,
    pub object_name: String,
    pub object_columns: Vec<String>,
    /// Declared names to apply positionally to the outermost projection
    pub positional_names: Option<Vec<String>>,
    pub supported: bool,
}

impl DdlStructure {
    fn unsupported(kind: String) -> Self {
        Self {
            ddl_type: DdlType::Unsupported,
            kind,
            object_name: String::new(),
            object_columns: Vec::new(),
            positional_names: None,
            supported: false,
        }
    }
}

/// Classify a top-level statement
pub fn classify(statement: &Statement) -> DdlStructure {
    match statement {
        Statement::CreateView(view) => {
            let declared: Vec<String> = view.columns.iter().map(|c| c.name.value.clone()).collect();
            with_query_columns(
                DdlType::CreateView,
                "CREATE VIEW",
                object_name_to_string(&view.name),
                declared,
                &view.query,
            )
        }
        Statement::CreateTable(create) => match &create.query {
            Some(query) => with_query_columns(
                DdlType::CreateTableAsSelect,
                "CREATE TABLE",
                object_name_to_string(&create.name),
                Vec::new(),
                query,
            ),
            None => DdlStructure {
                ddl_type: DdlType::CreateTable,
                kind: "CREATE TABLE".to_string(),
                object_name: object_name_to_string(&create.name),
                object_columns: create.columns.iter().map(|c| c.name.value.clone()).collect(),
                positional_names: None,
                supported: true,
            },
        },
        other => DdlStructure::unsupported(statement_kind(other)),
    }
}

fn with_query_columns(
    ddl_type: DdlType,
    kind: &str,
    object_name: String,
    declared: Vec<String>,
    query: &Query,
) -> DdlStructure {
    let projection = outermost_select(query)
        .map(|select| select.projection.as_slice())
        .unwrap_or_default();
    let projected: Vec<String> = projection.iter().filter_map(projection_output_name).collect();

    let (object_columns, positional_names) = if declared.is_empty() {
        (projected, None)
    } else {
        let has_wildcard = projection.iter().any(is_wildcard);
        let positional = (!has_wildcard && projection.len() == declared.len())
            .then(|| declared.clone());
        (declared, positional)
    };

    DdlStructure {
        ddl_type,
        kind: kind.to_string(),
        object_name,
        object_columns,
        positional_names,
        supported: true,
    }
}

/// The SELECT that defines a query's output columns
///
/// For set operations the leftmost operand names the columns.
pub fn outermost_select(query: &Query) -> Option<&Select> {
    leftmost_select(&query.body)
}

fn leftmost_select(body: &SetExpr) -> Option<&Select> {
    match body {
        SetExpr::Select(select) => Some(select),
        SetExpr::SetOperation { left, .. } => leftmost_select(left),
        SetExpr::Query(query) => outermost_select(query),
        _ => None,
    }
}

/// Query attached to a supported DDL statement
pub fn statement_query(statement: &Statement) -> Option<&Query> {
    match statement {
        Statement::CreateView(view) => Some(view.query.as_ref()),
        Statement::CreateTable(create) => create.query.as_deref(),
        _ => None,
    }
}

pub(crate) fn is_wildcard(item: &SelectItem) -> bool {
    matches!(
        item,
        SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..)
    )
}

/// Output column name of a projected item
///
/// Aliases win, plain column references use the column name, wildcards have
/// none, and other expressions use their rendered text with spaces turned
/// into underscores and parentheses removed, if it is short enough.
pub fn projection_output_name(item: &SelectItem) -> Option<String> {
    match item {
        SelectItem::ExprWithAlias { alias, .. } => Some(alias.value.clone()),
        SelectItem::UnnamedExpr(expr) => match expr {
            Expr::Identifier(ident) => Some(ident.value.clone()),
            Expr::CompoundIdentifier(idents) => idents.last().map(|i| i.value.clone()),
            other => expression_column_name(other),
        },
        SelectItem::Wildcard(_) | SelectItem::QualifiedWildcard(..) => None,
    }
}

/// Column name synthesized from an unaliased expression
pub fn expression_column_name(expr: &Expr) -> Option<String> {
    let rendered = expr.to_string();
    if rendered.chars().count() >= EXPRESSION_NAME_LIMIT {
        return None;
    }
    Some(rendered.replace(' ', "_").replace(['(', ')'], ""))
}

/// Statement kind for unsupported-statement errors
fn statement_kind(statement: &Statement) -> String {
    if let Statement::Query(_) = statement {
        return "SELECT".to_string();
    }
    let rendered = statement.to_string();
    let mut words = rendered
        .split_whitespace()
        .map(str::to_uppercase)
        .filter(|w| !matches!(w.as_str(), "OR" | "REPLACE" | "TEMPORARY" | "TEMP"));
    let first = words.next().unwrap_or_else(|| "UNKNOWN".to_string());
    match first.as_str() {
        "CREATE" | "ALTER" | "DROP" => match words.next() {
            Some(second) => format!("{first} {second}"),
            None => first,
        },
        _ => first,
    }
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
