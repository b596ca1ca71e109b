use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the roster database under `data_dir`.
///
/// The schema is created idempotently so an existing data directory opens
/// unchanged. `email_id` deliberately carries no UNIQUE constraint:
/// uniqueness is enforced by the lookup-before-insert in the ingestion
/// path, matching the store's upsert contract.
pub fn open_db(data_dir: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(data_dir)?;
    let db_path = data_dir.join("roster.sqlite3");
    let conn = Connection::open(db_path)?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS students(
            id TEXT PRIMARY KEY,
            sl_no INTEGER NOT NULL,
            email_id TEXT NOT NULL,
            student_name TEXT NOT NULL,
            markers TEXT NOT NULL
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_sl_no ON students(sl_no)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_students_email ON students(email_id)",
        [],
    )?;

    Ok(conn)
}
