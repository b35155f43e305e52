use super::*;
use crate::aliases::resolve_aliases;
use crate::parser::SqlParser;

fn resolve(sql: &str) -> LineageAnalysis {
    let stmt = SqlParser::snowflake().parse_single(sql).unwrap();
    let structure = crate::classify::classify(&stmt);
    let aliases = resolve_aliases(&stmt, &structure.object_name);
    let mut analysis = LineageAnalysis::new(&structure);
    analysis.absorb_aliases(&aliases);
    analysis.absorb_columns(resolve_columns(
        &stmt,
        &aliases,
        structure.positional_names.as_deref(),
    ));
    analysis
}

#[test]
fn test_qualified_direct_columns() {
    let a = resolve("CREATE VIEW v AS SELECT t.a, t.b AS bb FROM tbl t");
    assert_eq!(a.column_mappings.len(), 2);
    let a_map = a.direct("a").unwrap();
    assert_eq!(a_map.source_table, "tbl");
    assert_eq!(a_map.source_column, "a");
    assert_eq!(a_map.table_alias, "t");
    assert_eq!(a_map.resolution_method, ResolutionMethod::Direct);
    assert_eq!(a.direct("bb").unwrap().source_column, "b");
    assert!(a.derived_columns.is_empty());
}

#[test]
fn test_unqualified_column_uses_single_table() {
    let a = resolve("CREATE VIEW v AS SELECT id FROM db.sch.users");
    let id = a.direct("id").unwrap();
    assert_eq!(id.source_table, "db.sch.users");
    assert_eq!(id.table_alias, "");
}

#[test]
fn test_unqualified_column_with_join_is_unknown() {
    let a = resolve("CREATE VIEW v AS SELECT id FROM a JOIN b ON a.k = b.k");
    let id = a.direct("id").unwrap();
    assert_eq!(id.source_table, UNKNOWN_TABLE);
    assert_eq!(id.source_column, "id");
}

#[test]
fn test_unresolved_qualifier_keeps_raw_text() {
    let a = resolve("CREATE VIEW v AS SELECT zz.col FROM t");
    assert_eq!(a.direct("col").unwrap().source_table, "zz");
}

#[test]
fn test_case_insensitive_qualifier() {
    let a = resolve("CREATE VIEW v AS SELECT T1.a, t1.b FROM tbl t1");
    assert_eq!(a.direct("a").unwrap().source_table, "tbl");
    assert_eq!(a.direct("b").unwrap().source_table, "tbl");
}

#[test]
fn test_sum_is_derived() {
    let a = resolve("CREATE VIEW v AS SELECT SUM(t.amt) AS total FROM tbl t");
    let total = a.derived("total").unwrap();
    assert_eq!(total.expression_type, "SUM");
    assert_eq!(
        total.referenced_columns,
        vec![ColumnRef::new("tbl", "amt", "t")]
    );
    assert!(a.column_mappings.is_empty());
}

#[test]
fn test_referenced_columns_are_deduplicated_in_order() {
    let a = resolve("CREATE VIEW v AS SELECT o.b + o.a + o.b AS s FROM orders o");
    let s = a.derived("s").unwrap();
    assert_eq!(s.expression_type, "ADD");
    let cols: Vec<&str> = s.referenced_columns.iter().map(|c| c.column.as_str()).collect();
    assert_eq!(cols, vec!["b", "a"]);
}

#[test]
fn test_expression_types() {
    let a = resolve(
        "CREATE VIEW v AS SELECT \
         CASE WHEN t.x > 0 THEN 1 ELSE 0 END AS c1, \
         COALESCE(t.x, 0) AS c2, \
         NVL(t.x, 0) AS c3, \
         CAST(t.x AS INT) AS c4, \
         (t.x) AS c5, \
         t.x * 2 AS c6, \
         t.x / 2 AS c7, \
         t.x - 1 AS c8, \
         t.s || 'a' AS c9, \
         ROW_NUMBER() OVER (ORDER BY t.x) AS c10, \
         CURRENT_TIMESTAMP() AS c11, \
         LISTAGG(t.s, ',') AS c12, \
         'lit' AS c13, \
         UPPER(t.s) AS c14 \
         FROM tbl t",
    );
    let tag = |c: &str| a.derived(c).unwrap().expression_type.clone();
    assert_eq!(tag("c1"), "CASE");
    assert_eq!(tag("c2"), "COALESCE");
    assert_eq!(tag("c3"), "COALESCE");
    assert_eq!(tag("c4"), "CAST");
    assert_eq!(tag("c5"), "PAREN");
    assert_eq!(tag("c6"), "MUL");
    assert_eq!(tag("c7"), "DIV");
    assert_eq!(tag("c8"), "SUB");
    assert_eq!(tag("c9"), "CONCAT");
    assert_eq!(tag("c10"), "WINDOW");
    assert_eq!(tag("c11"), "CURRENTTIMESTAMP");
    assert_eq!(tag("c12"), "GROUPCONCAT");
    assert_eq!(tag("c13"), "LITERAL");
    assert_eq!(tag("c14"), "UPPER");
}

#[test]
fn test_literal_has_no_references() {
    let a = resolve("CREATE VIEW v AS SELECT 1 AS one, CURRENT_TIMESTAMP() AS ts FROM t");
    assert!(a.derived("one").unwrap().is_literal());
    assert!(a.derived("ts").unwrap().is_literal());
}

#[test]
fn test_datediff_skips_date_part() {
    let a = resolve("CREATE VIEW v AS SELECT DATEDIFF(day, o.start_at, o.end_at) AS d FROM orders o");
    let d = a.derived("d").unwrap();
    assert_eq!(d.expression_type, "DATEDIFF");
    let cols: Vec<&str> = d.referenced_columns.iter().map(|c| c.column.as_str()).collect();
    assert_eq!(cols, vec!["start_at", "end_at"]);
}

#[test]
fn test_unrecognized_node_keeps_raw_kind() {
    let a = resolve("CREATE VIEW v AS SELECT t.a IS NULL AS missing FROM t");
    assert_eq!(a.derived("missing").unwrap().expression_type, "IsNull");
}

#[test]
fn test_cte_columns_resolve_to_cte_target() {
    let a = resolve("CREATE VIEW v AS WITH c AS (SELECT x FROM tbl) SELECT c.x FROM c");
    assert_eq!(a.direct("x").unwrap().source_table, "CTE_c");
    assert_eq!(a.table_aliases.get("c").map(String::as_str), Some("CTE_c"));
    assert!(a.cte_definitions.contains_key("c"));
    assert!(a.source_tables.contains("tbl"));
}

#[test]
fn test_outer_select_wins_over_cte() {
    let a = resolve(
        "CREATE VIEW v AS WITH c AS (SELECT SUM(amt) AS total FROM tbl) SELECT c.total FROM c",
    );
    assert_eq!(a.direct("total").unwrap().source_table, "CTE_c");
    assert!(a.derived("total").is_none());
}

#[test]
fn test_nested_only_columns_are_kept() {
    let a = resolve(
        "CREATE VIEW v AS WITH c AS (SELECT amt * 2 AS dbl, id FROM tbl) SELECT c.id FROM c",
    );
    assert_eq!(a.derived("dbl").unwrap().expression_type, "MUL");
    assert_eq!(a.direct("id").unwrap().source_table, "CTE_c");
}

#[test]
fn test_positional_rename() {
    let a = resolve("CREATE VIEW v (x, y) AS SELECT t.a, SUM(t.b) FROM tbl t");
    assert_eq!(a.direct("x").unwrap().source_column, "a");
    assert_eq!(a.derived("y").unwrap().expression_type, "SUM");
    assert!(a.missing_columns().is_empty());
}

#[test]
fn test_insert_keeps_maps_disjoint() {
    let stmt = SqlParser::snowflake()
        .parse_single("CREATE VIEW v AS SELECT a FROM t")
        .unwrap();
    let mut a = LineageAnalysis::new(&crate::classify::classify(&stmt));
    a.insert_derived(
        "a",
        DerivedMapping {
            expression: "1".to_string(),
            expression_type: "LITERAL".to_string(),
            referenced_columns: vec![],
        },
    );
    a.insert_direct("a", DirectMapping::direct(ColumnRef::new("t", "a", "")));
    assert!(a.derived_columns.is_empty());
    assert_eq!(a.column_mappings.len(), 1);
}

#[test]
fn test_serializes_camel_case() {
    let a = resolve("CREATE VIEW v AS SELECT t.a FROM tbl t");
    let json = serde_json::to_value(&a).unwrap();
    assert_eq!(json["ddlType"], "CREATE_VIEW");
    assert_eq!(json["columnMappings"]["a"]["sourceTable"], "tbl");
    assert_eq!(json["columnMappings"]["a"]["resolutionMethod"], "direct");
    assert_eq!(json["tableAliases"]["t"], "tbl");
}

#[test]
fn test_unaliased_cte_expression_is_skipped() {
    let a = resolve(
        "CREATE VIEW v AS WITH c AS (SELECT UPPER(t.s), t.id FROM tbl t) SELECT c.id FROM c",
    );
    assert_eq!(a.derived_columns.len(), 0);
    assert_eq!(a.column_mappings.len(), 1);
    assert_eq!(a.direct("id").unwrap().source_table, "CTE_c");
}

#[test]
fn test_scalar_subquery_is_one_derived_column() {
    let a = resolve("CREATE VIEW v AS SELECT (SELECT MAX(u.x) FROM u) AS m, t.a FROM tbl t");
    assert_eq!(a.column_mappings.keys().collect::<Vec<_>>(), vec!["a"]);
    assert_eq!(a.derived_columns.keys().collect::<Vec<_>>(), vec!["m"]);
    assert_eq!(
        a.derived("m").unwrap().referenced_columns,
        vec![ColumnRef::new("u", "x", "u")]
    );
}

#[test]
fn test_first_union_branch_wins() {
    let a = resolve("CREATE VIEW v AS SELECT t.a FROM t UNION ALL SELECT u.a FROM u");
    assert_eq!(a.direct("a").unwrap().source_table, "t");
}
