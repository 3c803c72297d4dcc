use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use crate::config::DashConfig;
use crate::db::migrations::{MigrationManager, REQUIRED_TABLES};
use crate::error::{ReportError, Result};

/// Database connection manager
///
/// A connection lives for exactly one report action and is closed when it
/// goes out of scope, whether the action succeeded or not.
pub struct DbConnection;

impl DbConnection {
    /// Open the configured pipeline database read-only
    pub fn connect(config: &DashConfig) -> Result<Connection> {
        Self::connect_path(&config.data_location)
    }

    /// Open a pipeline database file read-only and check its tables
    pub fn connect_path(path: &Path) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|source| ReportError::Connection {
            path: path.to_path_buf(),
            source,
        })?;

        Self::verify_tables(&conn, path)?;
        log::debug!("Opened pipeline database {}", path.display());
        Ok(conn)
    }

    /// Run one report action on its own connection
    ///
    /// The connection is closed when this returns, on success and on error.
    pub fn scoped<T>(config: &DashConfig, action: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = Self::connect(config)?;
        action(&conn)
    }

    /// Connect to an in-memory database with the pipeline schema (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory().map_err(|source| ReportError::Connection {
            path: ":memory:".into(),
            source,
        })?;
        MigrationManager::initialize(&conn)
            .map_err(ReportError::query("initialize pipeline schema"))?;
        Ok(conn)
    }

    fn verify_tables(conn: &Connection, path: &Path) -> Result<()> {
        let mut stmt = conn
            .prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")
            .map_err(|source| ReportError::Connection {
                path: path.to_path_buf(),
                source,
            })?;

        for table in REQUIRED_TABLES {
            let count: i64 = stmt
                .query_row([table], |row| row.get(0))
                .map_err(|source| ReportError::Connection {
                    path: path.to_path_buf(),
                    source,
                })?;
            if count == 0 {
                return Err(ReportError::MissingTable {
                    path: path.to_path_buf(),
                    table: table.to_string(),
                });
            }
        }
        Ok(())
    }
}
