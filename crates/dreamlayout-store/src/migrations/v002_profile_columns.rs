use rusqlite::Connection;

use super::add_column_if_missing;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    add_column_if_missing(conn, "users", "about", "TEXT")?;
    add_column_if_missing(conn, "users", "profile_pic", "TEXT")?;
    add_column_if_missing(conn, "users", "location", "TEXT")?;
    Ok(())
}
