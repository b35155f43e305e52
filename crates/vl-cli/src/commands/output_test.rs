use super::*;
use vl_sql::{analyze, error_row, rows_for};

fn sample_rows() -> Vec<LineageRow> {
    let analysis = analyze(
        "CREATE VIEW sales AS SELECT o.id, SUM(o.amt) AS total FROM orders o GROUP BY o.id",
        "snowflake",
    )
    .unwrap();
    let mut rows = rows_for("sales", &analysis);
    rows.push(error_row("broken", "ANALYSIS_ERROR"));
    rows
}

#[test]
fn test_csv_output() {
    let csv = render_rows(&sample_rows(), OutputFormat::Csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "View_Name,View_Column,Column_Type,Source_Table,Source_Column,Expression_Type,Confidence_Score"
    );
    assert_eq!(lines[1], "sales,id,DIRECT,orders,id,,1.0");
    assert_eq!(lines[2], "sales,total,DERIVED,orders,amt,SUM,0.8");
    assert_eq!(lines[3], "BROKEN,,ERROR,ANALYSIS_ERROR,ANALYSIS_ERROR,,0.0");
}

#[test]
fn test_table_output() {
    let table = render_rows(&sample_rows(), OutputFormat::Table).unwrap();
    let mut lines = table.lines();
    assert!(lines.next().unwrap().starts_with("View_Name  View_Column"));
    assert!(lines.next().unwrap().starts_with("---------"));
    assert!(table.contains("DERIVED"));
}

#[test]
fn test_json_output() {
    let json = render_rows(&sample_rows(), OutputFormat::Json).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value.as_array().unwrap().len(), 3);
    assert_eq!(value[1]["expression_type"], "SUM");
    assert_eq!(value[0]["column_type"], "DIRECT");
    assert_eq!(value[0]["metadata"]["table_alias"], "o");
}
