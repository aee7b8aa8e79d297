use fitpact_infrastructure::persistence::Database;

#[tokio::test]
async fn database_creates_file_and_runs_migrations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("data").join("fitpact.db");

    let db = Database::new(db_path.to_str().expect("utf-8 path"))
        .await
        .expect("open database");
    db.run_migrations().await.expect("run migrations");

    // Re-running migrations on an up-to-date database is a no-op.
    db.run_migrations().await.expect("idempotent migrations");

    let tables: Vec<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
    )
    .fetch_all(db.pool())
    .await
    .expect("list tables");

    for expected in [
        "check_ins",
        "contract_day_marks",
        "contracts",
        "deposit_records",
        "deposit_usage_entries",
    ] {
        assert!(
            tables.iter().any(|t| t == expected),
            "missing table {expected}"
        );
    }
}
