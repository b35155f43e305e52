//! Wildcard and fallback resolution
//!
//! Columns the structural pass could not map (typically because the
//! projection is `SELECT *`) are attributed to the statement's main table.

use sqlparser::ast::{Statement, TableFactor};

use crate::aliases::{implicit_alias, TableAliases};
use crate::classify::{outermost_select, statement_query};
use crate::lineage::{DirectMapping, LineageAnalysis, ResolutionMethod};
use crate::object_name_to_string;

/// Table that unmapped columns are attributed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainTable {
    pub table: String,
    pub alias: String,
}

/// Find the main table of a statement
///
/// Prefers the first table of the outermost SELECT's FROM clause (a CTE
/// there yields its `CTE_<name>` target) and falls back to the first
/// non-CTE entry of the alias map.
pub fn find_main_table(
    statement: &Statement,
    aliases: &TableAliases,
    object_name: &str,
) -> Option<MainTable> {
    from_outermost_select(statement, aliases, object_name).or_else(|| {
        let table = aliases.first_source_table()?;
        Some(MainTable {
            table: table.to_string(),
            alias: implicit_alias(table),
        })
    })
}

fn from_outermost_select(
    statement: &Statement,
    aliases: &TableAliases,
    object_name: &str,
) -> Option<MainTable> {
    let select = outermost_select(statement_query(statement)?)?;
    select.from.iter().find_map(|from| {
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
        if table_name.eq_ignore_ascii_case(object_name) {
            return None;
        }

        let alias = alias
            .as_ref()
            .map(|a| a.name.value.clone())
            .unwrap_or_else(|| implicit_alias(&table_name));
        let table = if name.0.len() == 1 {
            aliases.cte_target(&table_name).unwrap_or(table_name)
        } else {
            table_name
        };
        Some(MainTable { table, alias })
    })
}

/// Map every column missing from the analysis to the main table
///
/// Returns the number of columns mapped. When no main table exists the
/// columns are left unmapped.
pub fn resolve_wildcards(
    analysis: &mut LineageAnalysis,
    statement: &Statement,
    aliases: &TableAliases,
    method: ResolutionMethod,
) -> usize {
    let missing = analysis.missing_columns();
    if missing.is_empty() {
        return 0;
    }

    let Some(main) = find_main_table(statement, aliases, &analysis.object_name) else {
        log::warn!(
            "No main table found for {}; {} column(s) left unmapped",
            analysis.object_name,
            missing.len()
        );
        return 0;
    };

    for column in &missing {
        analysis.insert_direct(
            column,
            DirectMapping::to_table(&main.table, column, &main.alias, method),
        );
    }
    log::debug!(
        "Mapped {} column(s) of {} to {} ({})",
        missing.len(),
        analysis.object_name,
        main.table,
        method
    );
    missing.len()
}

#[cfg(test)]
#[path = "wildcard_test.rs"]
mod tests;
