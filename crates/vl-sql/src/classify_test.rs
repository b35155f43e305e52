use super::*;
use crate::parser::SqlParser;

fn classify_sql(sql: &str) -> DdlStructure {
    let stmt = SqlParser::snowflake().parse_single(sql).unwrap();
    classify(&stmt)
}

#[test]
fn test_view_projection_names() {
    let s = classify_sql("CREATE VIEW db.sch.v AS SELECT t.a, t.b AS bb, SUM(t.c) FROM tbl t");
    assert_eq!(s.ddl_type, DdlType::CreateView);
    assert_eq!(s.object_name, "db.sch.v");
    assert_eq!(s.object_columns, vec!["a", "bb", "SUMt.c"]);
    assert!(s.supported);
    assert!(s.positional_names.is_none());
}

#[test]
fn test_wildcard_is_omitted() {
    let s = classify_sql("CREATE VIEW v AS SELECT *, x FROM t");
    assert_eq!(s.object_columns, vec!["x"]);
}

#[test]
fn test_long_expression_is_omitted() {
    let s = classify_sql(
        "CREATE VIEW v AS SELECT a, COALESCE(first_name_column, last_name_column, 'nobody at all') FROM t",
    );
    assert_eq!(s.object_columns, vec!["a"]);
}

#[test]
fn test_declared_columns_take_precedence() {
    let s = classify_sql("CREATE VIEW v (x, y) AS SELECT a, b FROM t");
    assert_eq!(s.object_columns, vec!["x", "y"]);
    assert_eq!(
        s.positional_names,
        Some(vec!["x".to_string(), "y".to_string()])
    );
}

#[test]
fn test_declared_columns_with_wildcard_are_not_positional() {
    let s = classify_sql("CREATE VIEW v (a, b) AS SELECT * FROM t");
    assert_eq!(s.object_columns, vec!["a", "b"]);
    assert!(s.positional_names.is_none());
}

#[test]
fn test_ctas() {
    let s = classify_sql("CREATE TABLE out_t AS SELECT id, amt * 2 AS dbl FROM src");
    assert_eq!(s.ddl_type, DdlType::CreateTableAsSelect);
    assert_eq!(s.object_name, "out_t");
    assert_eq!(s.object_columns, vec!["id", "dbl"]);
}

#[test]
fn test_plain_create_table() {
    let s = classify_sql("CREATE TABLE t (id INT, name VARCHAR)");
    assert_eq!(s.ddl_type, DdlType::CreateTable);
    assert_eq!(s.object_columns, vec!["id", "name"]);
}

#[test]
fn test_union_uses_leftmost_select() {
    let s = classify_sql("CREATE VIEW v AS SELECT a AS x FROM t UNION ALL SELECT b FROM u");
    assert_eq!(s.object_columns, vec!["x"]);
}

#[test]
fn test_unsupported_statements() {
    let s = classify_sql("INSERT INTO t SELECT * FROM u");
    assert!(!s.supported);
    assert_eq!(s.ddl_type, DdlType::Unsupported);
    assert_eq!(s.kind, "INSERT");

    let s = classify_sql("SELECT 1");
    assert_eq!(s.kind, "SELECT");

    let s = classify_sql("DROP TABLE t");
    assert_eq!(s.kind, "DROP TABLE");
}

#[test]
fn test_expression_column_name() {
    let stmt = SqlParser::snowflake().parse_single("SELECT a + b FROM t").unwrap();
    let Statement::Query(query) = stmt else {
        panic!("expected query");
    };
    let select = outermost_select(&query).unwrap();
    assert_eq!(
        projection_output_name(&select.projection[0]).as_deref(),
        Some("a_+_b")
    );
}

#[test]
fn test_ddl_type_serializes_screaming() {
    assert_eq!(
        serde_json::to_string(&DdlType::CreateTableAsSelect).unwrap(),
        "\"CREATE_TABLE_AS_SELECT\""
    );
    assert_eq!(DdlType::CreateView.to_string(), "CREATE_VIEW");
}
