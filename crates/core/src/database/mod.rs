//! Connection handling for the analytical store
//!
//! The pipeline never talks to DuckDB directly. It goes through two traits:
//!
//! - [`Connector`] opens a handle (and applies session settings)
//! - [`DatabaseConnection`] executes SQL text and is closed exactly once
//!
//! [`ConnectionGuard`] ties the two together: it owns the open connection
//! for the duration of a run and releases it either explicitly through
//! [`ConnectionGuard::release`] or, on any other exit path, when dropped.

mod error;
mod settings;

#[cfg(feature = "duckdb-backend")]
mod duckdb_backend;

use std::path::{Path, PathBuf};

use tracing::{info, warn};

pub use error::DatabaseError;
pub use settings::ConnectionSettings;

#[cfg(feature = "duckdb-backend")]
pub use duckdb_backend::{AccessMode, DuckDbConnection, DuckDbConnector};

/// An open, exclusively owned handle to the store
pub trait DatabaseConnection {
    /// Execute one statement or a whole script
    fn execute(&self, sql: &str) -> Result<(), DatabaseError>;

    /// Release the handle
    ///
    /// Takes `self` by value, so a closed handle cannot be used again.
    fn close(self) -> Result<(), DatabaseError>
    where
        Self: Sized;
}

/// Opens connections to one database
pub trait Connector {
    type Connection: DatabaseConnection;

    /// Open a handle and apply session-level settings
    fn open(&self) -> Result<Self::Connection, DatabaseError>;

    /// Human-readable location of the store, for logging
    fn location(&self) -> String;
}

/// Scoped ownership of an open connection
///
/// The wrapped connection is closed once: by [`release`](Self::release) when
/// the caller wants to observe close errors, otherwise by `Drop`.
pub struct ConnectionGuard<C: DatabaseConnection> {
    conn: Option<C>,
}

impl<C: DatabaseConnection> ConnectionGuard<C> {
    /// Take ownership of an open connection
    pub fn new(conn: C) -> Self {
        Self { conn: Some(conn) }
    }

    /// Borrow the live connection
    ///
    /// Returns an error only if the guard has already been released, which
    /// the guard's own API makes impossible from outside this module.
    pub fn connection(&self) -> Result<&C, DatabaseError> {
        self.conn
            .as_ref()
            .ok_or_else(|| DatabaseError::connection("connection already released"))
    }

    /// Execute SQL on the guarded connection
    pub fn execute(&self, sql: &str) -> Result<(), DatabaseError> {
        self.connection()?.execute(sql)
    }

    /// Close the connection now and report the outcome
    pub fn release(mut self) -> Result<(), DatabaseError> {
        match self.conn.take() {
            Some(conn) => conn.close(),
            None => Ok(()),
        }
    }
}

impl<C: DatabaseConnection> Drop for ConnectionGuard<C> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            if let Err(e) = conn.close() {
                warn!(error = %e, "Failed to close database connection");
            }
        }
    }
}

/// Delete a database file and its write-ahead log
///
/// Returns `true` if the database file existed. A missing file is not an
/// error.
pub fn destroy_database(path: &Path) -> Result<bool, std::io::Error> {
    let existed = remove_if_exists(path)?;
    remove_if_exists(&wal_path(path))?;

    if existed {
        info!(path = %path.display(), "Database has been destroyed");
    } else {
        info!(path = %path.display(), "No database to destroy");
    }
    Ok(existed)
}

fn wal_path(path: &Path) -> PathBuf {
    let mut wal = path.as_os_str().to_owned();
    wal.push(".wal");
    PathBuf::from(wal)
}

fn remove_if_exists(path: &Path) -> Result<bool, std::io::Error> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}
