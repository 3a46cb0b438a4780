use rusqlite::Connection;
use std::path::{Path, PathBuf};

pub const DB_FILE_NAME: &str = "gradebook.sqlite3";

pub fn db_path(workspace: &Path) -> PathBuf {
    workspace.join(DB_FILE_NAME)
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let conn = Connection::open(db_path(workspace))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT
        )",
        [],
    )?;

    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_dir(prefix: &str) -> PathBuf {
        let p = std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ));
        std::fs::create_dir_all(&p).expect("create temp dir");
        p
    }

    fn kv_columns(conn: &Connection) -> Vec<String> {
        let mut stmt = conn.prepare("PRAGMA table_info(kv)").expect("pragma");
        let rows = stmt
            .query_map([], |r| r.get::<_, String>(1))
            .expect("query");
        rows.map(|r| r.expect("column")).collect()
    }

    #[test]
    fn open_db_creates_kv_and_reopens_without_touching_rows() {
        let ws = temp_dir("gradebook-db-open");
        {
            let conn = open_db(&ws).expect("open_db");
            assert_eq!(kv_columns(&conn), vec!["key", "value", "updated_at"]);
            conn.execute("INSERT INTO kv(key, value) VALUES('students', '[\"Ada\"]')", [])
                .expect("seed");
        }

        let conn = open_db(&ws).expect("reopen");
        let value: String = conn
            .query_row("SELECT value FROM kv WHERE key = 'students'", [], |r| r.get(0))
            .expect("row kept");
        assert_eq!(value, "[\"Ada\"]");

        drop(conn);
        let _ = std::fs::remove_dir_all(ws);
    }
}
