use anyhow::Result;
use rusqlite::Connection;

use crate::Database;
use crate::store::{RecordStore, resolve_range};

impl RecordStore for Database {
    // -- Scalars --

    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_conn(|conn| query_value(conn, key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.with_conn(|conn| write_value(conn, key, value))
    }

    fn del(&self, key: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut removed = tx.execute("DELETE FROM kv WHERE key = ?1", [key])?;
            removed += tx.execute("DELETE FROM set_members WHERE key = ?1", [key])?;
            removed += tx.execute("DELETE FROM ranked_members WHERE key = ?1", [key])?;
            tx.commit()?;
            Ok(removed > 0)
        })
    }

    fn update(
        &self,
        key: &str,
        apply: &mut dyn FnMut(Option<String>) -> Result<Option<String>>,
    ) -> Result<Option<String>> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let current = query_value(&tx, key)?;
            let next = apply(current)?;
            if let Some(value) = &next {
                write_value(&tx, key, value)?;
            }
            tx.commit()?;
            Ok(next)
        })
    }

    // -- Sets --

    fn set_add(&self, key: &str, members: &[&str]) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut added = 0;
            for member in members {
                added += tx.execute(
                    "INSERT OR IGNORE INTO set_members (key, member) VALUES (?1, ?2)",
                    (key, member),
                )?;
            }
            tx.commit()?;
            Ok(added)
        })
    }

    fn set_members(&self, key: &str) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT member FROM set_members WHERE key = ?1")?;
            let members = stmt
                .query_map([key], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(members)
        })
    }

    // -- Ranked sets --

    fn ranked_add(&self, key: &str, entries: &[(&str, i64)]) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let mut added = 0;
            for (member, score) in entries {
                if query_score(&tx, key, member)?.is_none() {
                    added += 1;
                }
                tx.execute(
                    "INSERT INTO ranked_members (key, member, score) VALUES (?1, ?2, ?3)
                     ON CONFLICT(key, member) DO UPDATE SET score = excluded.score",
                    rusqlite::params![key, member, score],
                )?;
            }
            tx.commit()?;
            Ok(added)
        })
    }

    fn ranked_increment(&self, key: &str, delta: i64, member: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO ranked_members (key, member, score) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key, member) DO UPDATE SET score = score + excluded.score",
                rusqlite::params![key, member, delta],
            )?;
            let score = query_score(&tx, key, member)?
                .ok_or_else(|| anyhow::anyhow!("ranked member vanished: {} in {}", member, key))?;
            tx.commit()?;
            Ok(score)
        })
    }

    fn ranked_range_desc(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let len: i64 = conn.query_row(
                "SELECT COUNT(*) FROM ranked_members WHERE key = ?1",
                [key],
                |row| row.get(0),
            )?;

            let Some((offset, count)) = resolve_range(len as usize, start, stop) else {
                return Ok(vec![]);
            };

            let mut stmt = conn.prepare(
                "SELECT member FROM ranked_members
                 WHERE key = ?1
                 ORDER BY score DESC, seq ASC
                 LIMIT ?2 OFFSET ?3",
            )?;
            let members = stmt
                .query_map(rusqlite::params![key, count as i64, offset as i64], |row| {
                    row.get(0)
                })?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(members)
        })
    }

    fn ranked_rank_desc(&self, key: &str, member: &str) -> Result<Option<usize>> {
        self.with_conn(|conn| {
            let position: Option<(i64, i64)> = conn
                .query_row(
                    "SELECT score, seq FROM ranked_members WHERE key = ?1 AND member = ?2",
                    (key, member),
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            let Some((score, seq)) = position else {
                return Ok(None);
            };

            let ahead: i64 = conn.query_row(
                "SELECT COUNT(*) FROM ranked_members
                 WHERE key = ?1 AND (score > ?2 OR (score = ?2 AND seq < ?3))",
                rusqlite::params![key, score, seq],
                |row| row.get(0),
            )?;
            Ok(Some(ahead as usize))
        })
    }

    fn ranked_score(&self, key: &str, member: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| query_score(conn, key, member))
    }
}

fn query_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()
}

fn write_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        (key, value),
    )?;
    Ok(())
}

fn query_score(conn: &Connection, key: &str, member: &str) -> Result<Option<i64>> {
    conn.query_row(
        "SELECT score FROM ranked_members WHERE key = ?1 AND member = ?2",
        (key, member),
        |row| row.get(0),
    )
    .optional()
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
