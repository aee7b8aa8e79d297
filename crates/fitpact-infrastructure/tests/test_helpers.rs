use fitpact_infrastructure::persistence::Database;

/// Fresh in-memory database with the full schema applied.
#[allow(dead_code)]
pub async fn setup_in_memory_db() -> Database {
    let db = Database::in_memory().await.expect("create in-memory db");
    db.run_migrations().await.expect("run migrations");
    db
}
