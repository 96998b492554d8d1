//! Schema manager.
//!
//! [`ensure_schema`] runs on every startup against a database that may have
//! been created by any earlier version. Baseline tables are created with
//! `CREATE TABLE IF NOT EXISTS`; later columns are added one at a time and a
//! "duplicate column name" failure is treated as already applied. Any other
//! error is fatal.

pub mod v001_initial;
pub mod v002_profile_columns;
pub mod v003_user_key;
pub mod v004_project_flags;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// Migration steps in application order.
const STEPS: &[(&str, Step)] = &[
    ("v001_initial", v001_initial::up),
    ("v002_profile_columns", v002_profile_columns::up),
    ("v003_user_key", v003_user_key::up),
    ("v004_project_flags", v004_project_flags::up),
];

/// Bring the schema up to date. Safe to call any number of times.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    tracing::info!(steps = STEPS.len(), "ensuring database schema");

    for (name, up) in STEPS {
        tracing::debug!(step = name, "applying schema step");
        up(conn).map_err(|e| StoreError::Schema(format!("{name}: {e}")))?;
    }

    Ok(())
}

/// `ALTER TABLE .. ADD COLUMN`, swallowing "duplicate column name".
///
/// Returns `true` when the column was actually added by this call.
pub(crate) fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> rusqlite::Result<bool> {
    let sql = format!("ALTER TABLE {table} ADD COLUMN {column} {decl}");
    match conn.execute_batch(&sql) {
        Ok(()) => {
            tracing::info!(table, column, "added column");
            Ok(true)
        }
        Err(e) if is_duplicate_column(&e) => Ok(false),
        Err(e) => Err(e),
    }
}

fn is_duplicate_column(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("duplicate column name")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_names(conn: &Connection, table: &str) -> Vec<String> {
        let mut stmt = conn
            .prepare(&format!("SELECT name FROM pragma_table_info('{table}')"))
            .unwrap();
        let rows = stmt.query_map([], |row| row.get::<_, String>(0)).unwrap();
        rows.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        let users = column_names(&conn, "users");
        for col in ["id", "name", "email", "password_hash", "user_key", "created_at", "about", "profile_pic", "location"] {
            assert!(users.iter().any(|c| c == col), "users.{col} missing");
        }

        let projects = column_names(&conn, "projects");
        for col in [
            "id", "user_id", "title", "description", "thumbnail", "svg_content", "rooms",
            "design_philosophy", "is_deleted", "deleted_at", "created_at", "updated_at",
            "is_favourite", "is_public", "design_code",
        ] {
            assert!(projects.iter().any(|c| c == col), "projects.{col} missing");
        }
    }

    #[test]
    fn add_column_reports_whether_it_added() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY)").unwrap();

        assert!(add_column_if_missing(&conn, "t", "extra", "TEXT").unwrap());
        assert!(!add_column_if_missing(&conn, "t", "extra", "TEXT").unwrap());
    }

    #[test]
    fn other_schema_errors_propagate() {
        let conn = Connection::open_in_memory().unwrap();
        let err = add_column_if_missing(&conn, "no_such_table", "extra", "TEXT").unwrap_err();
        assert!(!is_duplicate_column(&err));
    }

    #[test]
    fn legacy_database_is_upgraded_in_place() {
        let conn = Connection::open_in_memory().unwrap();
        // Shape written by the first release: no profile columns, no owner key,
        // no project flags.
        conn.execute_batch(
            "CREATE TABLE users (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 name TEXT NOT NULL,
                 email TEXT UNIQUE NOT NULL,
                 password_hash TEXT NOT NULL,
                 created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
             );
             INSERT INTO users (name, email, password_hash) VALUES ('Ada', 'ada@example.com', 'h1');
             INSERT INTO users (name, email, password_hash) VALUES ('Bo', 'bo@example.com', 'h2');",
        )
        .unwrap();

        ensure_schema(&conn).unwrap();

        let keys: Vec<Option<String>> = {
            let mut stmt = conn.prepare("SELECT user_key FROM users ORDER BY id").unwrap();
            let rows = stmt.query_map([], |row| row.get(0)).unwrap();
            rows.map(|r| r.unwrap()).collect()
        };
        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| k.as_deref().is_some_and(|k| !k.is_empty())));
        assert_ne!(keys[0], keys[1]);

        // A second run must not regenerate the keys.
        ensure_schema(&conn).unwrap();
        let again: Option<String> = conn
            .query_row("SELECT user_key FROM users WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(again, keys[0]);
    }
}
