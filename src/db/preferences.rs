use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::warn;

use crate::theme::ThemeKey;

/// Key under which the selected theme is stored.
const THEME_KEY: &str = "theme";

/// Read a raw preference value, `None` when it was never written.
pub fn fetch_preference(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row(
        "SELECT value FROM preferences WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
    .context("failed to read preference")
}

/// Insert or overwrite a preference.
pub fn store_preference(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO preferences (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        params![key, value],
    )
    .context("failed to store preference")?;
    Ok(())
}

/// The persisted theme, falling back to the default when nothing (or
/// something unrecognised) was stored.
pub fn load_theme(conn: &Connection) -> Result<ThemeKey> {
    let Some(stored) = fetch_preference(conn, THEME_KEY)? else {
        return Ok(ThemeKey::default());
    };

    Ok(stored.parse().unwrap_or_else(|err| {
        warn!(%err, "ignoring stored theme");
        ThemeKey::default()
    }))
}

pub fn save_theme(conn: &Connection, theme: ThemeKey) -> Result<()> {
    store_preference(conn, THEME_KEY, theme.id())
}
