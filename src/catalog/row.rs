//! One row of the products → colors → sizes left join.

use crate::error::CatalogError;
use crate::executor::StoreError;
use may_postgres::types::FromSql;
use may_postgres::Row;
use rust_decimal::Decimal;

/// A flattened join row. Product scalars are always present; color and size
/// columns are null when the left join found nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRow {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub category_id: Option<i32>,
    pub gender: String,
    pub description: Option<String>,
    pub color_id: Option<i32>,
    pub color: Option<String>,
    pub image: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<u32>,
}

/// The join columns exactly as the driver returns them, every one nullable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCatalogRow {
    pub id: Option<i32>,
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<i32>,
    pub gender: Option<String>,
    pub description: Option<String>,
    pub color_id: Option<i32>,
    pub color: Option<String>,
    pub image: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<i32>,
}

impl CatalogRow {
    /// Decode a row selected by [`CatalogQuery`](super::CatalogQuery).
    ///
    /// A type mismatch is a [`StoreError::ParseError`]; everything else is
    /// checked by [`CatalogRow::from_columns`].
    pub fn from_row(row: &Row) -> Result<Self, CatalogError> {
        Self::from_columns(RawCatalogRow {
            id: column(row, "id")?,
            name: column(row, "name")?,
            price: column(row, "price")?,
            category_id: column(row, "category_id")?,
            gender: column(row, "gender")?,
            description: column(row, "description")?,
            color_id: column(row, "color_id")?,
            color: column(row, "color")?,
            image: column(row, "image")?,
            size: column(row, "size")?,
            quantity: column(row, "quantity")?,
        })
    }

    /// Check decoded columns against the join's guarantees.
    ///
    /// A null id, name, price or gender, a color id without a color name, a
    /// size without a quantity, or a negative quantity is a
    /// [`CatalogError::MalformedRow`].
    pub fn from_columns(raw: RawCatalogRow) -> Result<Self, CatalogError> {
        let id = required(raw.id, "id")?;

        if raw.color_id.is_some() && raw.color.is_none() {
            return Err(CatalogError::MalformedRow(format!(
                "product {id}: color {:?} has no name",
                raw.color_id
            )));
        }

        let quantity = match (raw.size.as_ref(), raw.quantity) {
            (_, Some(q)) => Some(u32::try_from(q).map_err(|_| {
                CatalogError::MalformedRow(format!("product {id}: negative quantity {q}"))
            })?),
            (Some(size), None) => {
                return Err(CatalogError::MalformedRow(format!(
                    "product {id}: size {size:?} has no quantity"
                )));
            }
            (None, None) => None,
        };

        Ok(Self {
            id,
            name: required(raw.name, "name")?,
            price: required(raw.price, "price")?,
            category_id: raw.category_id,
            gender: required(raw.gender, "gender")?,
            description: raw.description,
            color_id: raw.color_id,
            color: raw.color,
            image: raw.image,
            size: raw.size,
            quantity,
        })
    }
}

fn column<T>(row: &Row, name: &str) -> Result<Option<T>, CatalogError>
where
    T: for<'a> FromSql<'a>,
{
    row.try_get::<_, Option<T>>(name).map_err(|e| {
        CatalogError::Store(StoreError::ParseError(format!(
            "failed to decode column {name}: {e}"
        )))
    })
}

fn required<T>(value: Option<T>, name: &str) -> Result<T, CatalogError> {
    value.ok_or_else(|| CatalogError::MalformedRow(format!("required column {name} is null")))
}
