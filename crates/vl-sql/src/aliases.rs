//! Table and alias resolution from SQL AST
//!
//! Walks every table reference in a statement and records which alias
//! (explicit or implicit) points at which fully-qualified table. CTE names
//! are registered under a synthetic `CTE_<name>` target so column lineage
//! can tell CTE-sourced columns apart from real source tables.

use indexmap::{IndexMap, IndexSet};
use sqlparser::ast::{Query, Statement, TableFactor, Visit, Visitor};
use std::ops::ControlFlow;

use crate::object_name_to_string;
use crate::pattern::is_identifier_call;

/// Prefix of the synthetic alias target for CTE references
pub const CTE_PREFIX: &str = "CTE_";

/// Alias scope of one statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableAliases {
    /// lower(alias) -> fully-qualified table name or `CTE_<name>`
    pub table_aliases: IndexMap<String, String>,
    /// Base tables and views read by the statement
    pub source_tables: IndexSet<String>,
    /// CTE name -> raw sub-query text
    pub cte_definitions: IndexMap<String, String>,
}

impl TableAliases {
    /// Resolve a column qualifier (alias or table name), case-insensitively
    pub fn resolve(&self, qualifier: &str) -> Option<&str> {
        self.table_aliases
            .get(&qualifier.to_lowercase())
            .map(String::as_str)
    }

    /// Resolve a qualifier, keeping the raw text when no alias matches
    pub fn resolve_or_raw(&self, qualifier: &str) -> String {
        self.resolve(qualifier)
            .map(str::to_string)
            .unwrap_or_else(|| qualifier.to_string())
    }

    /// Whether `name` refers to a CTE defined in the statement
    pub fn is_cte(&self, name: &str) -> bool {
        self.cte_definitions
            .keys()
            .any(|cte| cte.eq_ignore_ascii_case(name))
    }

    /// Synthetic alias target for a CTE name, using the CTE's declared spelling
    pub fn cte_target(&self, name: &str) -> Option<String> {
        self.cte_definitions
            .keys()
            .find(|cte| cte.eq_ignore_ascii_case(name))
            .map(|cte| format!("{CTE_PREFIX}{cte}"))
    }

    /// First aliased table that is not a CTE placeholder
    pub fn first_source_table(&self) -> Option<&str> {
        self.table_aliases
            .values()
            .find(|target| !target.starts_with(CTE_PREFIX))
            .map(String::as_str)
    }

    /// Register a table reference under its explicit or implicit alias
    ///
    /// An implicit alias never replaces a CTE name: `raw.orders` read inside
    /// `WITH orders AS (...)` leaves `orders -> CTE_orders` in place.
    pub fn add_table(&mut self, table_name: &str, alias: Option<&str>) {
        self.source_tables.insert(table_name.to_string());
        let key = match alias {
            Some(alias) => alias.to_lowercase(),
            None => {
                let key = implicit_alias(table_name);
                let shadows_cte = self
                    .table_aliases
                    .get(&key)
                    .is_some_and(|target| target.starts_with(CTE_PREFIX));
                if shadows_cte {
                    return;
                }
                key
            }
        };
        self.table_aliases.insert(key, table_name.to_string());
    }

    fn add_cte_reference(&mut self, cte_name: &str, alias: Option<&str>) {
        let Some(target) = self.cte_target(cte_name) else {
            return;
        };
        let key = alias.unwrap_or(cte_name).to_lowercase();
        self.table_aliases.insert(key, target);
    }
}

/// Implicit alias of a table: its last dot-separated segment, lower-cased
pub fn implicit_alias(table_name: &str) -> String {
    table_name
        .rsplit('.')
        .next()
        .unwrap_or(table_name)
        .to_lowercase()
}

/// Build the alias map and source table set of a statement
///
/// References whose name equals `object_name` are skipped so a view that
/// mentions itself never lists itself as a source.
pub fn resolve_aliases(statement: &Statement, object_name: &str) -> TableAliases {
    let mut collector = AliasCollector {
        object_name,
        aliases: TableAliases::default(),
    };
    let _ = statement.visit(&mut collector);
    collector.aliases
}

struct AliasCollector<'a> {
    object_name: &'a str,
    aliases: TableAliases,
}

impl Visitor for AliasCollector<'_> {
    type Break = ();

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        // CTEs are registered before any table factor of the query is visited
        if let Some(with) = &query.with {
            for cte in &with.cte_tables {
                let name = cte.alias.name.value.clone();
                self.aliases
                    .table_aliases
                    .insert(name.to_lowercase(), format!("{CTE_PREFIX}{name}"));
                self.aliases
                    .cte_definitions
                    .insert(name, cte.query.to_string());
            }
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_table_factor(&mut self, table_factor: &TableFactor) -> ControlFlow<Self::Break> {
        let TableFactor::Table {
            name, alias, args, ..
        } = table_factor
        else {
            return ControlFlow::Continue(());
        };
        // Table-valued functions are not sources; IDENTIFIER() is resolved separately
        if args.is_some() || is_identifier_call(table_factor) {
            return ControlFlow::Continue(());
        }

        let table_name = object_name_to_string(name);
        if table_name.eq_ignore_ascii_case(self.object_name) {
            return ControlFlow::Continue(());
        }

        let alias = alias.as_ref().map(|a| a.name.value.as_str());
        if name.0.len() == 1 && self.aliases.is_cte(&table_name) {
            self.aliases.add_cte_reference(&table_name, alias);
        } else {
            self.aliases.add_table(&table_name, alias);
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
#[path = "aliases_test.rs"]
mod tests;
