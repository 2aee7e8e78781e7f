//! Catalog read and write operations.

use super::filter::{AttributeSearch, ProductFilter, SectionFilter};
use super::model::Product;
use super::projector::Projector;
use super::query::CatalogQuery;
use super::source::RowSource;
use super::writer::{self, NewProduct};
use crate::error::CatalogError;
use crate::pool::DbPool;
use crate::transaction::{IsolationLevel, Transaction};

/// Fetches join rows from a [`RowSource`] and projects them into products.
#[derive(Debug, Clone)]
pub struct CatalogService<S> {
    source: S,
    projector: Projector,
}

impl<S: RowSource> CatalogService<S> {
    pub fn new(source: S, projector: Projector) -> Self {
        Self { source, projector }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn projector(&self) -> &Projector {
        &self.projector
    }

    pub fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        log::debug!("listing products: {filter:?}");
        self.fetch_all(&CatalogQuery::products(filter))
    }

    pub fn list_section(&self, filter: &SectionFilter) -> Result<Vec<Product>, CatalogError> {
        log::debug!("listing section: {filter:?}");
        self.fetch_all(&CatalogQuery::section(filter))
    }

    /// No match is an empty list, not an error.
    pub fn search_products(&self, search: &AttributeSearch) -> Result<Vec<Product>, CatalogError> {
        log::debug!("searching products: {search:?}");
        self.fetch_all(&CatalogQuery::search(search))
    }

    /// Whether the backing store answers; drives `GET /health`.
    pub fn is_healthy(&self) -> bool {
        self.source.is_healthy()
    }

    pub fn product_detail(&self, id: i32) -> Result<Product, CatalogError> {
        let rows = self.source.fetch_rows(&CatalogQuery::detail(id))?;
        log::debug!("product {id}: {} row(s)", rows.len());
        self.projector.project_one(&rows)
    }

    fn fetch_all(&self, query: &CatalogQuery) -> Result<Vec<Product>, CatalogError> {
        let rows = self.source.fetch_rows(query)?;
        let products = self.projector.project(&rows);
        log::debug!(
            "{} query: {} row(s), {} product(s)",
            query.kind(),
            rows.len(),
            products.len()
        );
        Ok(products)
    }
}

impl CatalogService<DbPool> {
    pub fn add_product(&self, product: &NewProduct) -> Result<i32, CatalogError> {
        product.validate()?;
        self.in_transaction(IsolationLevel::ReadCommitted, |tx| writer::insert_product(tx, product))
    }

    pub fn replace_product(&self, id: i32, product: &NewProduct) -> Result<(), CatalogError> {
        product.validate()?;
        // A concurrent replace of the same product fails instead of interleaving color sets.
        self.in_transaction(IsolationLevel::RepeatableRead, |tx| {
            writer::replace_product(tx, id, product)
        })
    }

    pub fn remove_product(&self, id: i32) -> Result<(), CatalogError> {
        self.in_transaction(IsolationLevel::ReadCommitted, |tx| writer::delete_product(tx, id))
    }

    /// Run `f` in a transaction on one pooled connection. Commits on `Ok`,
    /// rolls back on `Err`.
    fn in_transaction<T>(
        &self,
        isolation_level: IsolationLevel,
        f: impl FnOnce(&Transaction) -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        // The connection must outlive the transaction using it.
        let connection = self.source.acquire()?;
        let tx = connection.begin_with_isolation(isolation_level)?;

        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback() {
                    log::error!("rollback after failed write failed: {rollback_err}");
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::image::ImagePolicy;
    use crate::catalog::query::QueryKind;
    use crate::catalog::row::CatalogRow;
    use crate::executor::StoreError;
    use rust_decimal::Decimal;
    use std::cell::RefCell;

    struct CannedRows {
        rows: Vec<CatalogRow>,
        seen: RefCell<Vec<QueryKind>>,
    }

    impl CannedRows {
        fn new(rows: Vec<CatalogRow>) -> Self {
            Self {
                rows,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl RowSource for CannedRows {
        fn fetch_rows(&self, query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
            self.seen.borrow_mut().push(query.kind());
            Ok(self.rows.clone())
        }
    }

    struct FailingSource;

    impl RowSource for FailingSource {
        fn fetch_rows(&self, _query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
            Err(StoreError::QueryError("connection reset".to_string()).into())
        }
    }

    fn row(id: i32, color_id: i32, size: &str) -> CatalogRow {
        CatalogRow {
            id,
            name: format!("Product {id}"),
            price: Decimal::new(2500, 2),
            category_id: None,
            gender: "women".to_string(),
            description: None,
            color_id: Some(color_id),
            color: Some("Black".to_string()),
            image: Some("/uploads/black.png".to_string()),
            size: Some(size.to_string()),
            quantity: Some(1),
        }
    }

    fn service<S: RowSource>(source: S) -> CatalogService<S> {
        CatalogService::new(
            source,
            Projector::new(ImagePolicy::absolute_url("http://localhost:5000")),
        )
    }

    #[test]
    fn test_list_products_projects_rows() {
        let catalog = service(CannedRows::new(vec![
            row(1, 10, "S"),
            row(2, 20, "M"),
            row(1, 10, "M"),
        ]));

        let products = catalog.list_products(&ProductFilter::default()).unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].colors[0].sizes.len(), 2);
        assert_eq!(
            products[0].colors[0].image.as_deref(),
            Some("http://localhost:5000/uploads/black.png")
        );
        assert_eq!(*catalog.source().seen.borrow(), vec![QueryKind::Products]);
    }

    #[test]
    fn test_search_without_matches_is_empty() {
        let catalog = service(CannedRows::new(Vec::new()));
        let products = catalog.search_products(&AttributeSearch::default()).unwrap();
        assert!(products.is_empty());
    }

    #[test]
    fn test_section_uses_section_query() {
        let catalog = service(CannedRows::new(vec![row(3, 30, "L")]));
        let filter = SectionFilter::new(Some("women".to_string()), None).unwrap();

        assert_eq!(catalog.list_section(&filter).unwrap().len(), 1);
        assert_eq!(*catalog.source().seen.borrow(), vec![QueryKind::Section]);
    }

    #[test]
    fn test_detail_not_found() {
        let catalog = service(CannedRows::new(Vec::new()));
        let err = catalog.product_detail(99).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn test_detail_found() {
        let catalog = service(CannedRows::new(vec![row(5, 50, "S"), row(5, 51, "S")]));
        let product = catalog.product_detail(5).unwrap();
        assert_eq!(product.id, 5);
        assert_eq!(product.colors.len(), 2);
    }

    struct DownSource;

    impl RowSource for DownSource {
        fn fetch_rows(&self, _query: &CatalogQuery) -> Result<Vec<CatalogRow>, CatalogError> {
            Ok(Vec::new())
        }

        fn is_healthy(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_health_follows_source() {
        assert!(service(CannedRows::new(Vec::new())).is_healthy());
        assert!(!service(DownSource).is_healthy());
    }

    #[test]
    fn test_store_errors_propagate() {
        let catalog = service(FailingSource);
        let err = catalog.list_products(&ProductFilter::default()).unwrap_err();
        assert!(matches!(err, CatalogError::Store(_)));
        assert!(!err.is_client_error());
    }
}
