//! Where catalog rows come from.

use super::query::CatalogQuery;
use super::row::CatalogRow;
use crate::error::CatalogError;
use crate::executor::{MayPostgresExecutor, StoreExecutor};
use crate::params::with_bound_params;
use crate::pool::{DbPool, PooledConnection};
use crate::transaction::Transaction;

/// Yields the flattened join rows for a [`CatalogQuery`].
///
/// The service only depends on this trait, so tests can feed it canned rows.
pub trait RowSource {
    fn fetch_rows(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError>;

    /// Whether the source can currently answer queries.
    fn is_healthy(&self) -> bool {
        true
    }
}

/// Run `query` on `executor` and decode every row.
pub fn fetch_rows<E: StoreExecutor + ?Sized>(
    executor: &E,
    query: &CatalogQuery,
) -> Result<Vec<CatalogRow>, CatalogError> {
    let (sql, values) = query.build();
    log::trace!("{} query: {sql}", query.kind());

    let rows = with_bound_params(&values, |params| executor.query_all(&sql, params))?;
    rows.iter().map(CatalogRow::from_row).collect()
}

impl RowSource for MayPostgresExecutor {
    fn fetch_rows(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
        fetch_rows(self, query)
    }

    fn is_healthy(&self) -> bool {
        self.check_health()
    }
}

impl RowSource for Transaction {
    fn fetch_rows(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
        fetch_rows(self, query)
    }
}

impl RowSource for PooledConnection<'_> {
    fn fetch_rows(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
        fetch_rows(self, query)
    }

    fn is_healthy(&self) -> bool {
        self.check_health()
    }
}

/// Holds a pooled connection only for the duration of one query.
impl RowSource for DbPool {
    fn fetch_rows(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
        let connection = self.acquire()?;
        fetch_rows(&connection, query)
    }

    /// Healthy when a connection can be checked out and answers `SELECT 1`.
    fn is_healthy(&self) -> bool {
        match self.acquire() {
            Ok(connection) => connection.check_health(),
            Err(e) => {
                log::warn!("health check could not acquire a connection: {e}");
                false
            }
        }
    }
}

impl<S: RowSource + ?Sized> RowSource for &S {
    fn fetch_rows(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
        (**self).fetch_rows(query)
    }

    fn is_healthy(&self) -> bool {
        (**self).is_healthy()
    }
}
