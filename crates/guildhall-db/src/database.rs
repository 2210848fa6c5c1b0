use std::collections::HashMap;

use guildhall_common::Result;
use serde::{Deserialize, Serialize};

/// A bound parameter or a fetched column value.
pub type SqlValue = rusqlite::types::Value;

/// Database engine family a handle is connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Sqlite,
    Mysql,
    Pgsql,
}

impl DatabaseEngine {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Mysql => "mysql",
            Self::Pgsql => "pgsql",
        }
    }
}

/// One fetched row, addressed by column name or alias.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlRow {
    columns: HashMap<String, SqlValue>,
}

impl SqlRow {
    pub fn new(columns: HashMap<String, SqlValue>) -> Self {
        Self { columns }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns.get(column)
    }

    /// Text value of `column`; `None` for NULL or a missing column.
    pub fn get_str(&self, column: &str) -> Option<&str> {
        match self.columns.get(column) {
            Some(SqlValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        match self.columns.get(column) {
            Some(SqlValue::Integer(i)) => Some(*i),
            Some(SqlValue::Text(s)) => s.parse().ok(),
            _ => None,
        }
    }
}

/// A live connection to the relational store.
///
/// Everything above this trait talks to the database through these methods
/// only, so installers and modules can run against any backend (or a fake).
/// Handles shared between threads are `dyn Database + Send + Sync`; the view
/// handed to a transaction closure is bound to the locked connection.
pub trait Database {
    fn engine(&self) -> DatabaseEngine;

    /// Version string reported by the connected engine.
    fn version(&self) -> Result<String>;

    /// Oldest engine version the schema is known to work with.
    fn minimum_required_version(&self) -> String;

    /// Whether the engine provides the scalar SQL function `name`.
    fn has_function(&self, name: &str) -> Result<bool>;

    fn table_prefix(&self) -> &str;

    /// Execute one statement, returning the number of affected rows.
    fn query_prepared(&self, sql: &str, params: &[SqlValue]) -> Result<usize>;

    /// Run a query and collect every row.
    fn get_array_from_sql(&self, sql: &str, params: &[SqlValue]) -> Result<Vec<SqlRow>>;

    /// Run `f` inside one transaction. The changes made through the handle
    /// passed to `f` are committed when it returns `Ok` and rolled back when
    /// it returns an error. Nested calls join the enclosing transaction.
    fn transaction(&self, f: &mut dyn FnMut(&dyn Database) -> Result<()>) -> Result<()>;

    /// Full name of a table, e.g. `users` -> `adm_users`.
    fn table(&self, name: &str) -> String {
        format!("{}_{}", self.table_prefix(), name)
    }
}
