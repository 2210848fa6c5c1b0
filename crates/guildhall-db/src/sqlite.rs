use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use guildhall_common::{Error, Result};
use guildhall_config::DatabaseConfig;
use rusqlite::{Connection, params_from_iter};
use tracing::{debug, info};

use crate::database::{Database, DatabaseEngine, SqlRow, SqlValue};

/// Oldest SQLite release with `RETURNING`, `DROP COLUMN` and the other
/// features the bundled scripts use.
pub const SQLITE_MINIMUM_VERSION: &str = "3.35.0";

/// `Database` backed by a single SQLite connection.
pub struct SqliteDatabase {
    conn: Mutex<Connection>,
    table_prefix: String,
    minimum_version: String,
}

impl SqliteDatabase {
    pub fn open(db_path: &Path, table_prefix: &str) -> Result<Self> {
        info!("opening database at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;
        Self::with_connection(conn, table_prefix)
    }

    pub fn in_memory(table_prefix: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;
        Self::with_connection(conn, table_prefix)
    }

    /// Open the database described by `config`, honouring its minimum
    /// version override.
    pub fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let mut db = Self::open(&config.path, &config.table_prefix)?;
        if let Some(min) = &config.minimum_version {
            db.minimum_version = min.clone();
        }
        Ok(db)
    }

    fn with_connection(conn: Connection, table_prefix: &str) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Ok(Self {
            conn: Mutex::new(conn),
            table_prefix: table_prefix.to_string(),
            minimum_version: SQLITE_MINIMUM_VERSION.to_string(),
        })
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("database lock poisoned".into()))
    }
}

impl Database for SqliteDatabase {
    fn engine(&self) -> DatabaseEngine {
        DatabaseEngine::Sqlite
    }

    fn version(&self) -> Result<String> {
        Ok(rusqlite::version().to_string())
    }

    fn minimum_required_version(&self) -> String {
        self.minimum_version.clone()
    }

    fn has_function(&self, name: &str) -> Result<bool> {
        probe_function(&*self.connection()?, name)
    }

    fn table_prefix(&self) -> &str {
        &self.table_prefix
    }

    fn query_prepared(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        execute(&*self.connection()?, sql, params)
    }

    fn get_array_from_sql(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        fetch_rows(&*self.connection()?, sql, params)
    }

    fn transaction(&self, f: &mut dyn FnMut(&dyn Database) -> Result<()>) -> Result<()> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;

        let scope = SqliteTransaction {
            conn: &*tx,
            table_prefix: &self.table_prefix,
            minimum_version: &self.minimum_version,
        };
        // Dropping `tx` without commit rolls back.
        f(&scope)?;

        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit transaction: {e}")))
    }
}

/// The locked connection of a running transaction.
struct SqliteTransaction<'a> {
    conn: &'a Connection,
    table_prefix: &'a str,
    minimum_version: &'a str,
}

impl Database for SqliteTransaction<'_> {
    fn engine(&self) -> DatabaseEngine {
        DatabaseEngine::Sqlite
    }

    fn version(&self) -> Result<String> {
        Ok(rusqlite::version().to_string())
    }

    fn minimum_required_version(&self) -> String {
        self.minimum_version.to_string()
    }

    fn has_function(&self, name: &str) -> Result<bool> {
        probe_function(self.conn, name)
    }

    fn table_prefix(&self) -> &str {
        self.table_prefix
    }

    fn query_prepared(&self, sql: &str, params: &[SqlValue]) -> Result<usize> {
        execute(self.conn, sql, params)
    }

    fn get_array_from_sql(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
        fetch_rows(self.conn, sql, params)
    }

    fn transaction(&self, f: &mut dyn FnMut(&dyn Database) -> Result<()>) -> Result<()> {
        f(self)
    }
}

fn probe_function(conn: &Connection, name: &str) -> Result<bool> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(Error::Database(format!("invalid function name: {name}")));
    }

    // Preparing a call to an unknown function fails with "no such function".
    let available = conn.prepare(&format!("SELECT {name}('a')")).is_ok();
    debug!("sqlite function {name} available: {available}");
    Ok(available)
}

fn execute(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<usize> {
    conn.execute(sql, params_from_iter(params.iter()))
        .map_err(|e| Error::Database(format!("query failed: {e}")))
}

fn fetch_rows(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>> {
    let mut stmt = conn
        .prepare(sql)
        .map_err(|e| Error::Database(format!("failed to prepare query: {e}")))?;
    let names: Vec<String> = stmt.column_names().iter().map(|n| n.to_string()).collect();

    let mut rows = stmt
        .query(params_from_iter(params.iter()))
        .map_err(|e| Error::Database(format!("failed to run query: {e}")))?;

    let mut result = Vec::new();
    while let Some(row) = rows
        .next()
        .map_err(|e| Error::Database(format!("failed to read row: {e}")))?
    {
        let mut columns = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            let value: SqlValue = row
                .get(i)
                .map_err(|e| Error::Database(format!("failed to read column {name}: {e}")))?;
            columns.insert(name.clone(), value);
        }
        result.push(SqlRow::new(columns));
    }
    Ok(result)
}
