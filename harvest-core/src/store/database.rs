use super::StoreError;
use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Schema of the bar table. Safe to run any number of times, concurrently.
pub const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS daily_bars (
    asset_id     TEXT NOT NULL,
    symbol       TEXT NOT NULL,
    display_name TEXT NOT NULL,
    data_source  TEXT NOT NULL,
    date         TEXT NOT NULL,
    open         TEXT NOT NULL,
    high         TEXT NOT NULL,
    low          TEXT NOT NULL,
    close        TEXT NOT NULL,
    volume       TEXT NOT NULL,
    PRIMARY KEY (asset_id, data_source, date)
);
";

const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
enum Target {
    File(PathBuf),
    /// URI of a named, shared-cache in-memory database.
    Memory(String),
}

/// Handle to the bar store.
///
/// Components receive this explicitly and open short-lived connections
/// from it, so readers never share a connection with the writer.
#[derive(Debug)]
pub struct Database {
    target: Target,
    busy_timeout: Duration,
    /// Keeps a shared in-memory database alive between connections.
    _keepalive: Option<Mutex<Connection>>,
}

impl Database {
    /// Open (creating if needed) a file-backed store and make sure the schema exists.
    ///
    /// The file is switched to WAL journaling so watermark reads proceed while
    /// another worker holds a write transaction.
    pub fn open_file(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let db = Self {
            target: Target::File(path),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            _keepalive: None,
        };

        let conn = db.connect()?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
        Self::ensure_schema(&conn)?;
        Ok(db)
    }

    /// Create a named in-memory store, shared by every connection opened from this handle.
    ///
    /// Two handles created with the same name in one process see the same data.
    pub fn in_memory(name: &str) -> Result<Self, StoreError> {
        let uri = format!("file:{name}?mode=memory&cache=shared");
        let keepalive = Connection::open(&uri)?;
        Self::ensure_schema(&keepalive)?;

        Ok(Self {
            target: Target::Memory(uri),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            _keepalive: Some(Mutex::new(keepalive)),
        })
    }

    /// Path of the backing file, if this is a file store.
    pub fn path(&self) -> Option<&Path> {
        match &self.target {
            Target::File(path) => Some(path),
            Target::Memory(_) => None,
        }
    }

    /// Open a new connection to the store.
    pub fn connect(&self) -> Result<Connection, StoreError> {
        let conn = match &self.target {
            Target::File(path) => Connection::open(path)?,
            Target::Memory(uri) => {
                let conn = Connection::open(uri)?;
                // Shared-cache readers would otherwise fail on table locks held by the writer.
                conn.pragma_update(None, "read_uncommitted", true)?;
                conn
            }
        };
        conn.busy_timeout(self.busy_timeout)?;
        Ok(conn)
    }

    /// Create the bar table if it does not exist yet.
    pub fn ensure_schema(conn: &Connection) -> Result<(), StoreError> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    /// Human-readable location, for logs.
    pub fn describe(&self) -> String {
        match &self.target {
            Target::File(path) => path.display().to_string(),
            Target::Memory(uri) => uri.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_count(conn: &Connection) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'daily_bars'",
            [],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn in_memory_creates_schema() {
        let db = Database::in_memory("database_creates_schema").unwrap();
        let conn = db.connect().unwrap();
        assert_eq!(table_count(&conn), 1);
        assert!(db.path().is_none());
    }

    #[test]
    fn ensure_schema_is_idempotent() {
        let db = Database::in_memory("database_schema_idempotent").unwrap();
        let conn = db.connect().unwrap();
        Database::ensure_schema(&conn).unwrap();
        Database::ensure_schema(&conn).unwrap();
        assert_eq!(table_count(&conn), 1);
    }

    #[test]
    fn same_name_shares_data() {
        let db = Database::in_memory("database_shared_name").unwrap();
        let writer = db.connect().unwrap();
        writer
            .execute(
                "INSERT INTO daily_bars VALUES ('a', 'A', 'A', 'test', '2024-01-01', '1', '1', '1', '1', '1')",
                [],
            )
            .unwrap();

        let reader = db.connect().unwrap();
        let rows: i64 = reader
            .query_row("SELECT COUNT(*) FROM daily_bars", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn open_file_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prices.db");

        let db = Database::open_file(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.path(), Some(path.as_path()));
        assert_eq!(table_count(&db.connect().unwrap()), 1);
    }

    #[test]
    fn reopening_existing_file_keeps_schema() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.db");

        Database::open_file(&path).unwrap();
        let db = Database::open_file(&path).unwrap();
        assert_eq!(table_count(&db.connect().unwrap()), 1);
    }
}
