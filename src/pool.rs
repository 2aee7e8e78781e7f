//! Bounded connection pool.
//!
//! Connections live in a bounded channel. [`DbPool::acquire`] takes one out and
//! hands back a [`PooledConnection`] guard; dropping the guard puts the
//! connection back, so a request can never leak its slot.

use crate::config::DatabaseConfig;
use crate::connection::{connect, redact_connection_string, ConnectionError};
use crate::executor::{MayPostgresExecutor, StoreError, StoreExecutor};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use may_postgres::types::ToSql;
use may_postgres::Row;
use std::ops::Deref;
use std::time::{Duration, Instant};

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

pub struct DbPool {
    idle_tx: Sender<MayPostgresExecutor>,
    idle_rx: Receiver<MayPostgresExecutor>,
    size: usize,
    acquire_timeout: Duration,
}

impl DbPool {
    /// Open `config.max_connections` connections up front.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, ConnectionError> {
        log::info!(
            "opening {} connection(s) to {}",
            config.max_connections,
            redact_connection_string(&config.url)
        );

        let mut executors = Vec::with_capacity(config.max_connections);
        for _ in 0..config.max_connections {
            executors.push(MayPostgresExecutor::new(connect(&config.url)?));
        }

        Ok(Self::from_executors(executors, config.pool_timeout()))
    }

    pub fn from_executors(executors: Vec<MayPostgresExecutor>, acquire_timeout: Duration) -> Self {
        let size = executors.len();
        let (idle_tx, idle_rx) = bounded(size.max(1));
        for executor in executors {
            // Capacity equals the number of executors, so this never blocks.
            let _ = idle_tx.send(executor);
        }

        Self {
            idle_tx,
            idle_rx,
            size,
            acquire_timeout,
        }
    }

    /// Take a connection, waiting at most the configured pool timeout.
    pub fn acquire(&self) -> Result<PooledConnection<'_>, StoreError> {
        #[cfg(feature = "tracing")]
        let _span = crate::metrics::tracing_helpers::acquire_connection_span().entered();

        let start = Instant::now();
        let executor = match self.idle_rx.recv_timeout(self.acquire_timeout) {
            Ok(executor) => executor,
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "no idle connection after {:?} ({} in pool)",
                    self.acquire_timeout,
                    self.size
                );
                return Err(StoreError::PoolTimeout(self.acquire_timeout));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(StoreError::Other("connection pool is closed".to_string()));
            }
        };

        #[cfg(feature = "metrics")]
        METRICS.record_pool_wait(start.elapsed());
        log::trace!("acquired pooled connection in {:?}", start.elapsed());

        Ok(PooledConnection {
            executor: Some(executor),
            pool: self,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn idle(&self) -> usize {
        self.idle_rx.len()
    }

    fn release(&self, executor: MayPostgresExecutor) {
        if self.idle_tx.try_send(executor).is_err() {
            log::error!("pool slot lost: idle queue full or closed on release");
        }
    }
}

/// A connection checked out of a [`DbPool`]; returned on drop.
pub struct PooledConnection<'a> {
    executor: Option<MayPostgresExecutor>,
    pool: &'a DbPool,
}

impl Deref for PooledConnection<'_> {
    type Target = MayPostgresExecutor;

    fn deref(&self) -> &MayPostgresExecutor {
        // Only `Drop` takes the executor out.
        self.executor
            .as_ref()
            .expect("pooled connection used after release")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(executor) = self.executor.take() {
            self.pool.release(executor);
        }
    }
}

impl StoreExecutor for PooledConnection<'_> {
    fn execute(&self, query: &str, params: &[&dyn ToSql]) -> Result<u64, StoreError> {
        self.deref().execute(query, params)
    }

    fn query_one(&self, query: &str, params: &[&dyn ToSql]) -> Result<Row, StoreError> {
        self.deref().query_one(query, params)
    }

    fn query_all(&self, query: &str, params: &[&dyn ToSql]) -> Result<Vec<Row>, StoreError> {
        self.deref().query_all(query, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pool_times_out() {
        let pool = DbPool::from_executors(Vec::new(), Duration::from_millis(10));
        assert_eq!(pool.size(), 0);
        assert_eq!(pool.idle(), 0);

        match pool.acquire() {
            Err(StoreError::PoolTimeout(waited)) => {
                assert_eq!(waited, Duration::from_millis(10))
            }
            Err(other) => panic!("expected pool timeout, got {other}"),
            Ok(_) => panic!("expected pool timeout, got a connection"),
        }
    }
}
