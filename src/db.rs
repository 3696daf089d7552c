use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const DB_FILE: &str = "attendance.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE);
    let conn = Connection::open(db_path)?;

    // One opaque JSON document per named record, like the browser's localStorage.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records(
            name TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings(
            key TEXT PRIMARY KEY,
            value_json TEXT NOT NULL
        )",
        [],
    )?;

    Ok(conn)
}

pub fn record_get(conn: &Connection, name: &str) -> anyhow::Result<Option<String>> {
    let v = conn
        .query_row("SELECT value FROM records WHERE name = ?", [name], |r| {
            r.get::<_, String>(0)
        })
        .optional()?;
    Ok(v)
}

pub fn record_set(conn: &Connection, name: &str, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO records(name, value) VALUES(?, ?)
         ON CONFLICT(name) DO UPDATE SET value = excluded.value",
        (name, value),
    )?;
    Ok(())
}

pub fn record_remove(conn: &Connection, name: &str) -> anyhow::Result<()> {
    conn.execute("DELETE FROM records WHERE name = ?", [name])?;
    Ok(())
}

pub fn settings_get_json(
    conn: &Connection,
    key: &str,
) -> anyhow::Result<Option<serde_json::Value>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT value_json FROM settings WHERE key = ?",
            [key],
            |r| r.get(0),
        )
        .optional()?;
    match raw {
        Some(s) => Ok(Some(serde_json::from_str(&s)?)),
        None => Ok(None),
    }
}

pub fn settings_set_json(
    conn: &Connection,
    key: &str,
    value: &serde_json::Value,
) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO settings(key, value_json) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value_json = excluded.value_json",
        (key, serde_json::to_string(value)?),
    )?;
    Ok(())
}
