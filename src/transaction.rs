//! Scoped transactions.
//!
//! A [`Transaction`] issues `BEGIN` on creation and must be closed with
//! [`Transaction::commit`] or [`Transaction::rollback`]. If it goes out of scope
//! still open (an early `?` return, a panic unwinding through a handler) it
//! issues `ROLLBACK` from `Drop`, so a half-written product never survives.

use crate::executor::{instrumented, StoreError, StoreExecutor};
use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use std::fmt;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;

/// Transaction isolation level
///
/// Writes that read back the row they are about to overwrite use
/// [`IsolationLevel::RepeatableRead`] so a concurrent edit fails instead of
/// being silently merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    /// Read committed (default)
    ReadCommitted,
    /// Repeatable read
    RepeatableRead,
    /// Serializable
    Serializable,
}

impl IsolationLevel {
    fn to_sql(self) -> &'static str {
        match self {
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::Serializable => "SERIALIZABLE",
        }
    }

    /// The statement that switches a fresh transaction to this level, if the
    /// server default is not already it.
    fn set_statement(self) -> Option<String> {
        match self {
            IsolationLevel::ReadCommitted => None,
            level => Some(format!("SET TRANSACTION ISOLATION LEVEL {}", level.to_sql())),
        }
    }
}

/// Transaction error type
#[derive(Debug)]
pub enum TransactionError {
    /// PostgreSQL error from may_postgres
    PostgresError(PostgresError),
}

impl fmt::Display for TransactionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionError::PostgresError(e) => write!(f, "PostgreSQL error: {e}"),
        }
    }
}

impl std::error::Error for TransactionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransactionError::PostgresError(e) => Some(e),
        }
    }
}

impl From<PostgresError> for TransactionError {
    fn from(err: PostgresError) -> Self {
        TransactionError::PostgresError(err)
    }
}

impl From<TransactionError> for StoreError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::PostgresError(e) => StoreError::PostgresError(e),
        }
    }
}

/// An open database transaction.
///
/// `commit` and `rollback` consume the transaction, so a closed one can never
/// be used again. `closed` only tells `Drop` whether a rollback is still owed.
pub struct Transaction {
    client: Client,
    closed: bool,
}

impl Transaction {
    pub(crate) fn new(
        client: Client,
        isolation_level: IsolationLevel,
    ) -> Result<Self, TransactionError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::begin_transaction_span().entered();

        client.execute("BEGIN", &[])?;

        // SET TRANSACTION must follow BEGIN to apply to this transaction.
        if let Some(statement) = isolation_level.set_statement() {
            if let Err(e) = client.execute(statement.as_str(), &[]) {
                let _ = client.execute("ROLLBACK", &[]);
                return Err(e.into());
            }
        }

        Ok(Self {
            client,
            closed: false,
        })
    }

    /// Commit every change made in this transaction.
    pub fn commit(mut self) -> Result<(), TransactionError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::commit_transaction_span().entered();

        // Mark closed first: a failed COMMIT leaves nothing for Drop to undo.
        self.closed = true;
        self.client.execute("COMMIT", &[])?;
        Ok(())
    }

    /// Discard every change made in this transaction.
    pub fn rollback(mut self) -> Result<(), TransactionError> {
        self.closed = true;
        self.rollback_inner()
    }

    fn rollback_inner(&self) -> Result<(), TransactionError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::rollback_transaction_span().entered();

        self.client.execute("ROLLBACK", &[])?;
        Ok(())
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        log::warn!("transaction dropped while open, rolling back");
        if let Err(e) = self.rollback_inner() {
            log::error!("rollback on drop failed: {e}");
        }
    }
}

impl StoreExecutor for Transaction {
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
