//! v003 -- Owner key.
//!
//! Adds `users.user_key` and, only when the column was new, fills it for every
//! existing row. The add and the backfill share one transaction so an
//! interrupted run leaves neither behind.

use dreamlayout_shared::codes::generate_owner_key;
use rusqlite::{params, Connection};

use super::add_column_if_missing;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    let tx = conn.unchecked_transaction()?;

    if add_column_if_missing(&tx, "users", "user_key", "TEXT")? {
        let filled = backfill(&tx)?;
        tracing::info!(rows = filled, "backfilled owner keys");
    }

    tx.execute_batch("CREATE UNIQUE INDEX IF NOT EXISTS idx_users_user_key ON users(user_key)")?;
    tx.commit()
}

fn backfill(conn: &Connection) -> Result<usize, rusqlite::Error> {
    let ids: Vec<i64> = {
        let mut stmt = conn.prepare("SELECT id FROM users WHERE user_key IS NULL")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<_, _>>()?
    };

    for id in &ids {
        conn.execute(
            "UPDATE users SET user_key = ?1 WHERE id = ?2",
            params![generate_owner_key(), id],
        )?;
    }
    Ok(ids.len())
}
