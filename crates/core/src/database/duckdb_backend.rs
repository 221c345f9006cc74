//! DuckDB implementation of the connection traits

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{debug, info};

use super::{ConnectionSettings, Connector, DatabaseConnection, DatabaseError};

/// Path that opens a transient in-memory database
const IN_MEMORY: &str = ":memory:";

/// How the database file is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AccessMode {
    /// Exclusive writer (setup, extract, transform)
    #[default]
    ReadWrite,
    /// Shared reader (presentation reads)
    ReadOnly,
}

/// Opens DuckDB connections to a single database file
#[derive(Debug, Clone)]
pub struct DuckDbConnector {
    path: PathBuf,
    settings: ConnectionSettings,
    access: AccessMode,
}

impl DuckDbConnector {
    /// Connector for the database file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            settings: ConnectionSettings::default(),
            access: AccessMode::ReadWrite,
        }
    }

    /// Connector for a transient in-memory database (for testing)
    pub fn memory() -> Self {
        Self::new(IN_MEMORY)
    }

    /// Apply session settings on every open
    pub fn with_settings(mut self, settings: ConnectionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Set the access mode
    pub fn with_access_mode(mut self, access: AccessMode) -> Self {
        self.access = access;
        self
    }

    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY
    }

    fn open_raw(&self) -> Result<duckdb::Connection, duckdb::Error> {
        if self.is_in_memory() {
            return duckdb::Connection::open_in_memory();
        }
        match self.access {
            AccessMode::ReadWrite => duckdb::Connection::open(&self.path),
            AccessMode::ReadOnly => {
                let config = duckdb::Config::default().access_mode(duckdb::AccessMode::ReadOnly)?;
                duckdb::Connection::open_with_flags(&self.path, config)
            }
        }
    }
}

impl Connector for DuckDbConnector {
    type Connection = DuckDbConnection;

    fn open(&self) -> Result<DuckDbConnection, DatabaseError> {
        info!(path = %self.path.display(), access = ?self.access, "Connecting to database");

        let conn = self
            .open_raw()
            .map_err(|e| DatabaseError::connection(e.to_string()))?;

        for statement in self.settings.statements() {
            // Values may hold credentials, only the option name is logged
            debug!(
                option = statement.split('=').next().unwrap_or_default(),
                "Applying session setting"
            );
            conn.execute_batch(&statement)
                .map_err(|e| DatabaseError::connection(e.to_string()))?;
        }

        Ok(DuckDbConnection {
            conn,
            path: self.path.clone(),
        })
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// An open DuckDB connection
pub struct DuckDbConnection {
    conn: duckdb::Connection,
    path: PathBuf,
}

impl DuckDbConnection {
    /// Database file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Execute a query and return results as JSON
    pub fn query(&self, sql: &str) -> Result<Vec<serde_json::Value>, DatabaseError> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query([])?;

        // Column names are only known once the statement has run
        let column_count = rows.as_ref().map(|r| r.column_count()).unwrap_or(0);
        let column_names: Vec<String> = (0..column_count)
            .map(|i| {
                rows.as_ref()
                    .and_then(|r| r.column_name(i).ok())
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| format!("col{}", i))
            })
            .collect();

        let mut results = Vec::new();

        while let Some(row) = rows.next()? {
            let mut obj = serde_json::Map::new();
            for (i, name) in column_names.iter().enumerate() {
                let value: duckdb::types::Value = row.get(i)?;
                obj.insert(name.clone(), value_to_json(value));
            }
            results.push(serde_json::Value::Object(obj));
        }

        Ok(results)
    }
}

impl DatabaseConnection for DuckDbConnection {
    fn execute(&self, sql: &str) -> Result<(), DatabaseError> {
        self.conn.execute_batch(sql).map_err(DatabaseError::from)
    }

    fn close(self) -> Result<(), DatabaseError> {
        info!(path = %self.path.display(), "Closing database connection");
        self.conn
            .close()
            .map_err(|(_, e)| DatabaseError::connection(e.to_string()))
    }
}

fn value_to_json(value: duckdb::types::Value) -> serde_json::Value {
    use duckdb::types::Value;

    match value {
        Value::Null => serde_json::Value::Null,
        Value::Boolean(b) => serde_json::Value::Bool(b),
        Value::TinyInt(n) => serde_json::Value::Number(n.into()),
        Value::SmallInt(n) => serde_json::Value::Number(n.into()),
        Value::Int(n) => serde_json::Value::Number(n.into()),
        Value::BigInt(n) => serde_json::Value::Number(n.into()),
        Value::UTinyInt(n) => serde_json::Value::Number(n.into()),
        Value::USmallInt(n) => serde_json::Value::Number(n.into()),
        Value::UInt(n) => serde_json::Value::Number(n.into()),
        Value::UBigInt(n) => serde_json::Value::Number(n.into()),
        Value::Float(f) => serde_json::Number::from_f64(f as f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Double(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s),
        Value::Date32(days) => DateTime::from_timestamp(i64::from(days) * SECONDS_PER_DAY, 0)
            .map(|dt| serde_json::Value::String(dt.date_naive().to_string()))
            .unwrap_or(serde_json::Value::Null),
        Value::Timestamp(unit, v) => timestamp_to_utc(unit, v)
            .map(|dt| serde_json::Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            .unwrap_or(serde_json::Value::Null),
        other => serde_json::Value::String(format!("{:?}", other)),
    }
}

const SECONDS_PER_DAY: i64 = 86_400;

fn timestamp_to_utc(unit: duckdb::types::TimeUnit, value: i64) -> Option<DateTime<Utc>> {
    use duckdb::types::TimeUnit;

    match unit {
        TimeUnit::Second => DateTime::from_timestamp(value, 0),
        TimeUnit::Millisecond => DateTime::from_timestamp_millis(value),
        TimeUnit::Microsecond => DateTime::from_timestamp_micros(value),
        TimeUnit::Nanosecond => DateTime::from_timestamp(
            value.div_euclid(1_000_000_000),
            value.rem_euclid(1_000_000_000) as u32,
        ),
    }
}
