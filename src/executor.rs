//! Store execution over `may_postgres`.
//!
//! [`StoreExecutor`] is the seam every catalog read and write goes through. The
//! direct client ([`MayPostgresExecutor`]), a pooled connection and an open
//! [`Transaction`](crate::transaction::Transaction) all implement it, so query
//! code never cares which one it was handed.

use crate::transaction::{IsolationLevel, Transaction, TransactionError};
use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;
use std::time::{Duration, Instant};

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

/// Store error type
#[derive(Debug)]
pub enum StoreError {
    /// `PostgreSQL` error from `may_postgres`
    PostgresError(PostgresError),
    /// Query construction or execution error
    QueryError(String),
    /// Column decoding error
    ParseError(String),
    /// No pooled connection became free in time
    PoolTimeout(Duration),
    /// Other store errors
    Other(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::PostgresError(e) => write!(f, "PostgreSQL error: {e}"),
            StoreError::QueryError(s) => write!(f, "Query error: {s}"),
            StoreError::ParseError(s) => write!(f, "Parse error: {s}"),
            StoreError::PoolTimeout(waited) => {
                write!(f, "Timed out after {waited:?} waiting for a pooled connection")
            }
            StoreError::Other(s) => write!(f, "Store error: {s}"),
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::PostgresError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PostgresError> for StoreError {
    fn from(err: PostgresError) -> Self {
        StoreError::PostgresError(err)
    }
}

/// Executes SQL against the relational store.
///
/// Parameters are always bound positionally (`$1`, `$2`, ...); callers never
/// splice values into the SQL text.
pub trait StoreExecutor {
    /// Execute a statement and return the number of rows affected.
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError>;

    /// Execute a query that must return exactly one row.
    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError>;

    /// Execute a query and return every row.
    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError>;
}

impl<E: StoreExecutor + ?Sized> StoreExecutor for &E {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        (**self).execute(query, params)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
        (**self).query_one(query, params)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError> {
        (**self).query_all(query, params)
    }
}

/// Runs one store call with the span, timing and error accounting shared by
/// every executor in the crate.
pub(crate) fn instrumented<T>(
    query: &str,
    op: impl FnOnce() -> Result<T, PostgresError>,
) -> Result<T, StoreError> {
    #[cfg(feature = "tracing")]
    let _span = tracing_helpers::execute_query_span(query).entered();
    #[cfg(not(feature = "tracing"))]
    let _ = query;

    let start = Instant::now();
    let result = op().map_err(|e| {
        #[cfg(feature = "metrics")]
        METRICS.record_query_error();
        log::warn!("store query failed: {e}");
        StoreError::PostgresError(e)
    });

    let duration = start.elapsed();
    #[cfg(feature = "metrics")]
    METRICS.record_query_duration(duration);
    log::trace!("store query finished in {duration:?}");

    result
}

/// `StoreExecutor` backed directly by a `may_postgres::Client`.
pub struct MayPostgresExecutor {
    client: Client,
}

impl MayPostgresExecutor {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Start a transaction at the given isolation level.
    ///
    /// The returned [`Transaction`] rolls back when dropped without
    /// [`commit`](Transaction::commit).
    pub fn begin_with_isolation(
        &self,
        isolation_level: IsolationLevel,
    ) -> Result<Transaction, TransactionError> {
        Transaction::new(self.client.clone(), isolation_level)
    }

    /// Run `SELECT 1` and report whether the connection answered.
    pub fn check_health(&self) -> bool {
        match self.client.query_one("SELECT 1", &[]) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("connection health check failed: {e}");
                false
            }
        }
    }
}

impl StoreExecutor for MayPostgresExecutor {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        instrumented(query, || self.client.execute(query, params))
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
        instrumented(query, || self.client.query_one(query, params))
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError> {
        instrumented(query, || self.client.query(query, params))
    }
}
