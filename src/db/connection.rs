use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

/// SQLite file name stored inside the application data directory.
const DB_FILE_NAME: &str = "preferences.sqlite";

/// Ensure the database file exists under `data_dir`, run lazy migrations, and
/// return a live connection.
pub fn open_store(data_dir: &Path) -> Result<Connection> {
    fs::create_dir_all(data_dir).context("failed to create data directory")?;

    let conn = Connection::open(data_dir.join(DB_FILE_NAME))
        .context("failed to open SQLite database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Throwaway store used when the on-disk one is unavailable; preferences then
/// last for the session only.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    ensure_schema(&conn)?;
    Ok(conn)
}

/// Create the key/value table if it does not exist yet.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS preferences (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )
    .context("failed to create preferences table")?;

    Ok(())
}
