//! # Outlet
//!
//! Storefront catalog service on the `may` coroutine runtime.
//!
//! Products live in PostgreSQL across three tables (products, their colors,
//! and the sizes of each color). Reads run a single left join and fold the
//! flattened rows back into a `Product → Color → Size` tree; see
//! [`catalog::Projector`]. Listing, section and attribute-search filters are
//! rendered to bound-parameter predicates with `sea-query`.
//!
//! ```no_run
//! use outlet::catalog::{CatalogService, ImagePolicy, ProductFilter, Projector};
//! use outlet::config::OutletConfig;
//! use outlet::pool::DbPool;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OutletConfig::load()?;
//! let pool = DbPool::connect(&config.database)?;
//! let catalog = CatalogService::new(pool, Projector::new(ImagePolicy::PassThrough));
//!
//! let filter = ProductFilter {
//!     search_term: Some("women".to_string()),
//!     ..Default::default()
//! };
//! for product in catalog.list_products(&filter)? {
//!     println!("{} ({} colors)", product.name, product.colors.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod executor;
pub mod http;
pub mod metrics;
pub mod params;
pub mod pool;
pub mod schema;
pub mod transaction;

pub use catalog::{CatalogService, Product, Projector};
pub use connection::{connect, ConnectionError};
pub use error::CatalogError;
pub use executor::{MayPostgresExecutor, StoreError, StoreExecutor};
pub use pool::{DbPool, PooledConnection};
pub use transaction::{IsolationLevel, Transaction, TransactionError};
