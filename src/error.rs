//! Catalog error type.

use crate::executor::StoreError;
use crate::transaction::TransactionError;
use std::fmt;

#[derive(Debug)]
pub enum CatalogError {
    /// The requested product does not exist
    NotFound(String),
    /// The request is missing or carries an invalid parameter
    InvalidRequest(String),
    /// A fetched row violates the join's guarantees
    MalformedRow(String),
    /// The store failed
    Store(StoreError),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound(s) => write!(f, "{s}"),
            CatalogError::InvalidRequest(s) => write!(f, "{s}"),
            CatalogError::MalformedRow(s) => write!(f, "Malformed catalog row: {s}"),
            CatalogError::Store(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        CatalogError::Store(err)
    }
}

impl From<TransactionError> for CatalogError {
    fn from(err: TransactionError) -> Self {
        CatalogError::Store(err.into())
    }
}

impl CatalogError {
    /// Errors that are the client's fault and safe to echo back.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CatalogError::NotFound(_) | CatalogError::InvalidRequest(_)
        )
    }
}
