use rusqlite::Connection;

const SCHEMA: &str = include_str!("schema.sql");

pub fn run(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA)?;

    // Migration: add modified_date column if it doesn't exist (for databases
    // created before expense updates stamped a modification time)
    let has_modified_date: bool = conn
        .prepare("SELECT COUNT(*) FROM pragma_table_info('expenses') WHERE name='modified_date'")?
        .query_row([], |row| row.get::<_, i32>(0))
        .map(|c| c > 0)
        .unwrap_or(false);

    if !has_modified_date {
        conn.execute_batch("ALTER TABLE expenses ADD COLUMN modified_date TEXT;")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        run(&conn).expect("first run");
        run(&conn).expect("second run");

        let tables: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name IN ('users','sessions','expenses')",
                [],
                |row| row.get(0),
            )
            .expect("count tables");
        assert_eq!(tables, 3);
    }
}
