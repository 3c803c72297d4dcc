use rusqlite::{Connection, Result};
use std::collections::HashMap;

/// Current pipeline schema version
const CURRENT_VERSION: u32 = 2;

/// Tables every report reads
pub const REQUIRED_TABLES: [&str; 3] = ["employee", "client", "client_stage_progression"];

/// Versioned schema for the pipeline tables
///
/// Production databases are provisioned by the CRM; this is what local
/// fixture databases and tests are built from.
pub struct MigrationManager;

impl MigrationManager {
    /// Create the schema_version table and apply all pending migrations
    pub fn initialize(conn: &Connection) -> Result<()> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            )",
            [],
        )?;

        let current_version = Self::get_version(conn)?;

        for version in (current_version + 1)..=CURRENT_VERSION {
            Self::apply_migration(conn, version)?;
        }

        Ok(())
    }

    fn apply_migration(conn: &Connection, version: u32) -> Result<()> {
        let migrations = get_migrations();
        if let Some(migration) = migrations.get(&version) {
            let tx = conn.unchecked_transaction()?;
            migration(&tx)?;
            tx.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [version],
            )?;
            tx.commit()?;
            log::debug!("Applied pipeline schema migration v{}", version);
            Ok(())
        } else {
            Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_MISUSE),
                Some(format!("No migration found for version {}", version)),
            ))
        }
    }

    /// Get the current schema version
    pub fn get_version(conn: &Connection) -> Result<u32> {
        conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
    }
}

fn get_migrations() -> HashMap<u32, fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>> {
    let mut migrations: HashMap<u32, fn(&rusqlite::Transaction) -> Result<(), rusqlite::Error>> = HashMap::new();
    migrations.insert(1, migration_v1);
    migrations.insert(2, migration_v2);
    migrations
}

/// Migration v1: reference tables and the stage progression log
fn migration_v1(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute("PRAGMA foreign_keys=ON", [])?;

    tx.execute(
        "CREATE TABLE employee (
            id INTEGER PRIMARY KEY,
            fullname TEXT NOT NULL
        )",
        [],
    )?;

    tx.execute(
        "CREATE TABLE client (
            id INTEGER PRIMARY KEY,
            fullname TEXT NOT NULL,
            assigned_employee INTEGER NULL REFERENCES employee(id)
        )",
        [],
    )?;

    // Append-only: one row per stage a client entered
    tx.execute(
        "CREATE TABLE client_stage_progression (
            id INTEGER PRIMARY KEY,
            client_id INTEGER NOT NULL REFERENCES client(id),
            current_stage INTEGER NOT NULL,
            created_on INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Migration v2: indexes for per-client history and window scans
fn migration_v2(tx: &rusqlite::Transaction) -> Result<(), rusqlite::Error> {
    tx.execute(
        "CREATE INDEX idx_csp_client_created ON client_stage_progression(client_id, created_on)",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_csp_created_on ON client_stage_progression(created_on)",
        [],
    )?;
    tx.execute(
        "CREATE INDEX idx_client_assigned_employee ON client(assigned_employee)",
        [],
    )?;
    Ok(())
}
