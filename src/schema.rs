//! Catalog tables.

use crate::executor::{StoreError, StoreExecutor};

const CREATE_CATEGORIES: &str = r#"
    CREATE TABLE IF NOT EXISTS categories (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL UNIQUE
    )
"#;

const CREATE_PRODUCTS: &str = r#"
    CREATE TABLE IF NOT EXISTS products (
        id SERIAL PRIMARY KEY,
        name VARCHAR(255) NOT NULL,
        price NUMERIC(10, 2) NOT NULL CHECK (price >= 0),
        category_id INTEGER REFERENCES categories(id) ON DELETE SET NULL,
        gender VARCHAR(16) NOT NULL,
        description TEXT
    )
"#;

const CREATE_PRODUCT_COLORS: &str = r#"
    CREATE TABLE IF NOT EXISTS product_colors (
        id SERIAL PRIMARY KEY,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        color VARCHAR(64) NOT NULL,
        image VARCHAR(512)
    )
"#;

const CREATE_PRODUCT_SIZES: &str = r#"
    CREATE TABLE IF NOT EXISTS product_sizes (
        id SERIAL PRIMARY KEY,
        product_id INTEGER NOT NULL REFERENCES products(id) ON DELETE CASCADE,
        color_id INTEGER NOT NULL REFERENCES product_colors(id) ON DELETE CASCADE,
        size VARCHAR(16) NOT NULL,
        quantity INTEGER NOT NULL DEFAULT 0 CHECK (quantity >= 0)
    )
"#;

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_product_colors_product_id ON product_colors(product_id)",
    "CREATE INDEX IF NOT EXISTS idx_product_sizes_color_id ON product_sizes(color_id)",
];

/// Create the catalog tables and indexes if they don't exist.
///
/// Safe to run on every start; existing tables are left alone.
pub fn ensure_schema<E: StoreExecutor + ?Sized>(executor: &E) -> Result<(), StoreError> {
    for ddl in [
        CREATE_CATEGORIES,
        CREATE_PRODUCTS,
        CREATE_PRODUCT_COLORS,
        CREATE_PRODUCT_SIZES,
    ] {
        executor.execute(ddl, &[])?;
    }
    for ddl in INDEXES {
        executor.execute(ddl, &[])?;
    }
    log::info!("catalog schema ready");
    Ok(())
}
