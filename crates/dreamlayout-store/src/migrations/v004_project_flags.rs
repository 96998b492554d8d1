use rusqlite::Connection;

use super::add_column_if_missing;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    add_column_if_missing(conn, "projects", "is_favourite", "INTEGER NOT NULL DEFAULT 0")?;
    add_column_if_missing(conn, "projects", "is_public", "INTEGER NOT NULL DEFAULT 0")?;
    add_column_if_missing(conn, "projects", "design_code", "TEXT")?;

    // NULL codes (rows older than this step) do not collide with each other.
    conn.execute_batch(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_projects_design_code ON projects(design_code);
         CREATE INDEX IF NOT EXISTS idx_projects_public_updated
             ON projects(is_public, updated_at DESC);",
    )
}
