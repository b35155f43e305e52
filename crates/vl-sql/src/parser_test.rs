use super::*;

#[test]
fn test_parse_create_view() {
    let parser = SqlParser::snowflake();
    let stmts = parser
        .parse("CREATE OR REPLACE VIEW v AS SELECT id, name FROM users WHERE id = 1")
        .unwrap();
    assert_eq!(stmts.len(), 1);
}

#[test]
fn test_parse_multiple_statements() {
    let parser = SqlParser::snowflake();
    let stmts = parser.parse("SELECT 1; SELECT 2;").unwrap();
    assert_eq!(stmts.len(), 2);
}

#[test]
fn test_parse_single_keeps_first() {
    let parser = SqlParser::snowflake();
    let stmt = parser
        .parse_single("CREATE VIEW a AS SELECT 1 AS x; CREATE VIEW b AS SELECT 2 AS y")
        .unwrap();
    assert!(stmt.to_string().contains("VIEW a"));
}

#[test]
fn test_parse_empty() {
    let parser = SqlParser::snowflake();
    assert!(matches!(parser.parse(""), Err(SqlError::EmptySql)));
    assert!(matches!(parser.parse("   \n\t"), Err(SqlError::EmptySql)));
}

#[test]
fn test_parse_error() {
    let parser = SqlParser::snowflake();
    let result = parser.parse("CREATE VIEW v AS SELECT a FROM");
    assert!(matches!(result, Err(SqlError::ParseError { .. })));
}

#[test]
fn test_from_dialect_name() {
    let parser = SqlParser::from_dialect_name("snowflake").unwrap();
    assert_eq!(parser.dialect_name(), "snowflake");

    let parser = SqlParser::from_dialect_name("DuckDB").unwrap();
    assert_eq!(parser.dialect_name(), "duckdb");

    let parser = SqlParser::from_dialect_name("ansi").unwrap();
    assert_eq!(parser.dialect_name(), "generic");

    let result = SqlParser::from_dialect_name("oracle");
    assert!(matches!(result, Err(SqlError::UnknownDialect(_))));
}

#[test]
fn test_default_is_snowflake() {
    assert_eq!(SqlParser::default().dialect_name(), DEFAULT_DIALECT);
}
