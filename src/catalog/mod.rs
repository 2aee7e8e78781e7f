//! The storefront catalog.
//!
//! Products are stored flat across `products`, `product_colors` and
//! `product_sizes`. A read runs one left join over the three tables
//! ([`CatalogQuery`]), decodes the rows ([`CatalogRow`]) and folds them back
//! into a `Product → Color → Size` tree ([`Projector`]).

pub mod filter;
pub mod image;
pub mod model;
pub mod projector;
pub mod query;
pub mod row;
pub mod service;
pub mod source;
pub mod tables;
pub mod writer;

pub use filter::{
    AttributeSearch, Gender, ProductFilter, RequestedGender, SearchTerm, SectionFilter,
};
pub use image::ImagePolicy;
pub use model::{Color, Product, Size};
pub use projector::Projector;
pub use query::{CatalogQuery, QueryKind};
pub use row::{CatalogRow, RawCatalogRow};
pub use service::CatalogService;
pub use source::{fetch_rows, RowSource};
pub use writer::{NewColor, NewProduct, NewSize};
