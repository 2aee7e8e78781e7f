//! The catalog join query.

use super::filter::{AttributeSearch, ProductFilter, SectionFilter};
use super::tables::{ProductColors, ProductSizes, Products, RowAlias};
use sea_query::{
    Condition, Expr, ExprTrait, JoinType, PostgresQueryBuilder, Query, SelectStatement, Values,
};
use std::fmt;

/// Which endpoint a query serves. Used for logging and spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryKind {
    Products,
    Section,
    Search,
    Detail,
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryKind::Products => "products",
            QueryKind::Section => "section",
            QueryKind::Search => "search",
            QueryKind::Detail => "detail",
        };
        f.write_str(name)
    }
}

/// A products → colors → sizes left join with a filter applied.
///
/// Rows come back in whatever order the store picks; the projector does not
/// depend on contiguity.
#[derive(Debug, Clone)]
pub struct CatalogQuery {
    kind: QueryKind,
    statement: SelectStatement,
}

impl CatalogQuery {
    pub fn products(filter: &ProductFilter) -> Self {
        Self::filtered(QueryKind::Products, filter.condition())
    }

    pub fn section(filter: &SectionFilter) -> Self {
        Self::filtered(QueryKind::Section, filter.condition())
    }

    pub fn search(search: &AttributeSearch) -> Self {
        Self::filtered(QueryKind::Search, search.condition())
    }

    pub fn detail(id: i32) -> Self {
        Self::filtered(
            QueryKind::Detail,
            Condition::all().add(Expr::col((Products::Table, Products::Id)).eq(id)),
        )
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    /// Render to Postgres SQL with `$n` placeholders and their values.
    pub fn build(&self) -> (String, Values) {
        self.statement.clone().build(PostgresQueryBuilder)
    }

    fn filtered(kind: QueryKind, condition: Condition) -> Self {
        let mut statement = joined_select();
        if !condition.is_empty() {
            statement.cond_where(condition);
        }
        Self { kind, statement }
    }
}

fn joined_select() -> SelectStatement {
    Query::select()
        .columns([
            (Products::Table, Products::Id),
            (Products::Table, Products::Name),
            (Products::Table, Products::Price),
            (Products::Table, Products::CategoryId),
            (Products::Table, Products::Gender),
            (Products::Table, Products::Description),
        ])
        .expr_as(Expr::col((ProductColors::Table, ProductColors::Id)), RowAlias::ColorId)
        .column((ProductColors::Table, ProductColors::Color))
        .column((ProductColors::Table, ProductColors::Image))
        .column((ProductSizes::Table, ProductSizes::Size))
        .column((ProductSizes::Table, ProductSizes::Quantity))
        .from(Products::Table)
        .join(
            JoinType::LeftJoin,
            ProductColors::Table,
            Expr::col((Products::Table, Products::Id))
                .equals((ProductColors::Table, ProductColors::ProductId)),
        )
        .join(
            JoinType::LeftJoin,
            ProductSizes::Table,
            Expr::col((ProductColors::Table, ProductColors::Id))
                .equals((ProductSizes::Table, ProductSizes::ColorId)),
        )
        .to_owned()
}
