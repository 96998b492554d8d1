//! v001 -- Baseline tables.
//!
//! Creates `users` and `projects` with the columns the first release had.
//! Everything added later lives in its own step.

use rusqlite::Connection;

const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT NOT NULL,
    email         TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    created_at    TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

-- ----------------------------------------------------------------
-- Projects
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS projects (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id           INTEGER NOT NULL,             -- FK -> users(id)
    title             TEXT NOT NULL,
    description       TEXT,
    thumbnail         TEXT,                         -- mirrored rendering URL
    svg_content       TEXT,                         -- first floor markup
    rooms             TEXT,                         -- JSON floor payload
    design_philosophy TEXT,                         -- model narrative
    is_deleted        INTEGER NOT NULL DEFAULT 0,   -- boolean 0/1
    deleted_at        TEXT,                         -- RFC-3339, set iff is_deleted
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,

    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_projects_owner_updated
    ON projects(user_id, updated_at DESC);
"#;

/// Apply the baseline schema.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
