//! Catalog writes: insert, replace and delete whole products.
//!
//! Each function issues several statements, so callers run them inside a
//! [`Transaction`](crate::transaction::Transaction). Colors and sizes are
//! always written as a unit with their product.

use super::filter::Gender;
use crate::error::CatalogError;
use crate::executor::{StoreError, StoreExecutor};
use may_postgres::Row;
use rust_decimal::Decimal;
use serde::Deserialize;

const INSERT_PRODUCT: &str = "INSERT INTO products (name, price, category_id, gender, description) \
     VALUES ($1, $2, $3, $4, $5) RETURNING id";
const UPDATE_PRODUCT: &str = "UPDATE products \
     SET name = $1, price = $2, category_id = $3, gender = $4, description = $5 WHERE id = $6";
const DELETE_PRODUCT: &str = "DELETE FROM products WHERE id = $1";
const INSERT_COLOR: &str =
    "INSERT INTO product_colors (product_id, color, image) VALUES ($1, $2, $3) RETURNING id";
const INSERT_SIZE: &str =
    "INSERT INTO product_sizes (product_id, color_id, size, quantity) VALUES ($1, $2, $3, $4)";
const DELETE_SIZES: &str = "DELETE FROM product_sizes WHERE product_id = $1";
const DELETE_COLORS: &str = "DELETE FROM product_colors WHERE product_id = $1";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Decimal,
    pub category_id: Option<i32>,
    pub gender: String,
    pub description: Option<String>,
    #[serde(default)]
    pub colors: Vec<NewColor>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewColor {
    pub color: String,
    /// Stored image reference, e.g. `/uploads/tee-red.png`.
    pub image: Option<String>,
    #[serde(default)]
    pub sizes: Vec<NewSize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewSize {
    pub size: String,
    pub quantity: u32,
}

impl NewProduct {
    /// Check the input and return the canonical gender to store.
    pub fn validate(&self) -> Result<Gender, CatalogError> {
        if self.name.trim().is_empty() {
            return Err(invalid("Product name is required"));
        }
        if self.price.is_sign_negative() {
            return Err(invalid("Price must not be negative"));
        }
        let gender = Gender::from_synonym(&self.gender)
            .ok_or_else(|| invalid(&format!("Unknown gender {:?}", self.gender)))?;

        for color in &self.colors {
            if color.color.trim().is_empty() {
                return Err(invalid("Color name is required"));
            }
            for size in &color.sizes {
                if size.size.trim().is_empty() {
                    return Err(invalid("Size label is required"));
                }
                quantity_param(size.quantity)?;
            }
        }

        Ok(gender)
    }
}

/// Insert a product with its colors and sizes; returns the new product id.
pub fn insert_product<E: StoreExecutor + ?Sized>(
    executor: &E,
    product: &NewProduct,
) -> Result<i32, CatalogError> {
    let gender = product.validate()?;

    let row = executor.query_one(
        INSERT_PRODUCT,
        &[
            &product.name.trim(),
            &product.price,
            &product.category_id,
            &gender.as_str(),
            &product.description,
        ],
    )?;
    let id = returned_id(&row)?;

    insert_colors(executor, id, &product.colors)?;
    log::info!("inserted product {id} with {} color(s)", product.colors.len());
    Ok(id)
}

/// Overwrite a product's scalars and replace all of its colors and sizes.
pub fn replace_product<E: StoreExecutor + ?Sized>(
    executor: &E,
    id: i32,
    product: &NewProduct,
) -> Result<(), CatalogError> {
    let gender = product.validate()?;

    let updated = executor.execute(
        UPDATE_PRODUCT,
        &[
            &product.name.trim(),
            &product.price,
            &product.category_id,
            &gender.as_str(),
            &product.description,
            &id,
        ],
    )?;
    if updated == 0 {
        return Err(not_found());
    }

    // Sizes reference colors, so they go first.
    executor.execute(DELETE_SIZES, &[&id])?;
    executor.execute(DELETE_COLORS, &[&id])?;
    insert_colors(executor, id, &product.colors)?;

    log::info!("replaced product {id} with {} color(s)", product.colors.len());
    Ok(())
}

/// Delete a product. Colors and sizes go with it via `ON DELETE CASCADE`.
pub fn delete_product<E: StoreExecutor + ?Sized>(
    executor: &E,
    id: i32,
) -> Result<(), CatalogError> {
    if executor.execute(DELETE_PRODUCT, &[&id])? == 0 {
        return Err(not_found());
    }
    log::info!("deleted product {id}");
    Ok(())
}

fn insert_colors<E: StoreExecutor + ?Sized>(
    executor: &E,
    product_id: i32,
    colors: &[NewColor],
) -> Result<(), CatalogError> {
    for color in colors {
        let row = executor.query_one(
            INSERT_COLOR,
            &[&product_id, &color.color.trim(), &color.image],
        )?;
        let color_id = returned_id(&row)?;

        for size in &color.sizes {
            let quantity = quantity_param(size.quantity)?;
            executor.execute(
                INSERT_SIZE,
                &[&product_id, &color_id, &size.size.trim(), &quantity],
            )?;
        }
    }
    Ok(())
}

fn returned_id(row: &Row) -> Result<i32, CatalogError> {
    row.try_get::<_, i32>("id").map_err(|e| {
        CatalogError::Store(StoreError::ParseError(format!(
            "failed to read returned id: {e}"
        )))
    })
}

// quantity is an INTEGER column
fn quantity_param(quantity: u32) -> Result<i32, CatalogError> {
    i32::try_from(quantity).map_err(|_| invalid(&format!("Quantity {quantity} is too large")))
}

fn invalid(message: &str) -> CatalogError {
    CatalogError::InvalidRequest(message.to_string())
}

fn not_found() -> CatalogError {
    CatalogError::NotFound("Product not found".to_string())
}
