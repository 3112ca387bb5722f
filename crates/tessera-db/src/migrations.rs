use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv (
            key         TEXT PRIMARY KEY,
            value       TEXT NOT NULL,
            updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS set_members (
            key         TEXT NOT NULL,
            member      TEXT NOT NULL,
            PRIMARY KEY (key, member)
        );

        -- seq orders members that share a score: earlier insertions rank first
        CREATE TABLE IF NOT EXISTS ranked_members (
            seq         INTEGER PRIMARY KEY AUTOINCREMENT,
            key         TEXT NOT NULL,
            member      TEXT NOT NULL,
            score       INTEGER NOT NULL,
            UNIQUE(key, member)
        );

        CREATE INDEX IF NOT EXISTS idx_ranked_members_order
            ON ranked_members(key, score DESC, seq ASC);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
