use super::*;
use vl_sql::ColumnType;

fn input(name: &str, sql: &str) -> DdlInput {
    DdlInput {
        name: name.to_string(),
        sql: sql.to_string(),
    }
}

fn config() -> Config {
    Config {
        jobs: 2,
        ..Config::default()
    }
}

#[tokio::test]
async fn test_rows_keep_input_order() {
    let inputs = vec![
        input("first", "CREATE VIEW first_v AS SELECT t.a FROM tbl t"),
        input("second", "CREATE VIEW second_v AS SELECT u.b FROM other u"),
        input("third", "CREATE VIEW third_v AS SELECT w.c FROM w"),
    ];
    let rows = analyze_inputs(inputs, &config(), None).await;
    let views: Vec<&str> = rows.iter().map(|r| r.view_name.as_str()).collect();
    assert_eq!(views, vec!["first_v", "second_v", "third_v"]);
}

#[tokio::test]
async fn test_empty_ddl_is_not_found() {
    let rows = analyze_inputs(vec![input("ghost", "  ")], &config(), None).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].view_name, "GHOST");
    assert_eq!(rows[0].source_table, DDL_NOT_FOUND);
}

#[tokio::test]
async fn test_failed_analysis_is_error_row() {
    let rows = analyze_inputs(vec![input("bad", "CREATE VIEW v AS SELECT a FROM")], &config(), None).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].column_type, ColumnType::Error);
    assert_eq!(rows[0].source_table, ANALYSIS_ERROR);
    assert!(rows[0]
        .metadata
        .error
        .as_deref()
        .unwrap()
        .starts_with("Analysis failed: "));
}

#[tokio::test]
async fn test_view_name_override() {
    let rows = analyze_inputs(
        vec![input("stdin", "CREATE VIEW v AS SELECT t.a FROM tbl t")],
        &config(),
        Some("reporting.v_sales"),
    )
    .await;
    assert_eq!(rows[0].view_name, "reporting.v_sales");
}

#[tokio::test]
async fn test_timed_out_work_keeps_its_slot() {
    let slots = Arc::new(Semaphore::new(1));
    let (done_tx, done_rx) = std::sync::mpsc::channel();

    let outcome = run_in_slot(Arc::clone(&slots), Duration::from_millis(20), move || {
        std::thread::sleep(Duration::from_millis(300));
        let _ = done_tx.send(());
    })
    .await;
    assert!(matches!(outcome, SlotOutcome::TimedOut));
    assert_eq!(slots.available_permits(), 0);

    done_rx.recv().unwrap();
    // The permit drops right after the closure returns
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(slots.available_permits(), 1);
}

#[tokio::test]
async fn test_next_work_waits_for_timed_out_slot() {
    let slots = Arc::new(Semaphore::new(1));
    let outcome = run_in_slot(Arc::clone(&slots), Duration::from_millis(10), || {
        std::thread::sleep(Duration::from_millis(200));
    })
    .await;
    assert!(matches!(outcome, SlotOutcome::TimedOut));

    // The timeout of the next call only starts once the slot is free
    let started = std::time::Instant::now();
    let outcome = run_in_slot(slots, Duration::from_millis(100), || 7).await;
    assert!(matches!(outcome, SlotOutcome::Finished(7)));
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[tokio::test]
async fn test_panicking_work_fails() {
    let slots = Arc::new(Semaphore::new(1));
    let outcome: SlotOutcome<()> =
        run_in_slot(Arc::clone(&slots), Duration::from_secs(5), || panic!("boom")).await;
    assert!(matches!(outcome, SlotOutcome::Failed(_)));
    assert_eq!(slots.available_permits(), 1);
}
