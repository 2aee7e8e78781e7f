//! Table and column identifiers for the catalog schema.

use sea_query::Iden;

#[derive(Debug, Clone, Copy)]
pub enum Products {
    Table,
    Id,
    Name,
    Price,
    CategoryId,
    Gender,
    Description,
}

impl Iden for Products {
    fn unquoted(&self) -> &str {
        match self {
            Products::Table => "products",
            Products::Id => "id",
            Products::Name => "name",
            Products::Price => "price",
            Products::CategoryId => "category_id",
            Products::Gender => "gender",
            Products::Description => "description",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ProductColors {
    Table,
    Id,
    ProductId,
    Color,
    Image,
}

impl Iden for ProductColors {
    fn unquoted(&self) -> &str {
        match self {
            ProductColors::Table => "product_colors",
            ProductColors::Id => "id",
            ProductColors::ProductId => "product_id",
            ProductColors::Color => "color",
            ProductColors::Image => "image",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ProductSizes {
    Table,
    ColorId,
    Size,
    Quantity,
}

impl Iden for ProductSizes {
    fn unquoted(&self) -> &str {
        match self {
            ProductSizes::Table => "product_sizes",
            ProductSizes::ColorId => "color_id",
            ProductSizes::Size => "size",
            ProductSizes::Quantity => "quantity",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Categories {
    Table,
    Id,
    Name,
}

impl Iden for Categories {
    fn unquoted(&self) -> &str {
        match self {
            Categories::Table => "categories",
            Categories::Id => "id",
            Categories::Name => "name",
        }
    }
}

/// Output column aliases of the catalog join.
#[derive(Debug, Clone, Copy)]
pub enum RowAlias {
    ColorId,
}

impl Iden for RowAlias {
    fn unquoted(&self) -> &str {
        match self {
            RowAlias::ColorId => "color_id",
        }
    }
}
