//! The nested catalog tree returned to clients.
//!
//! Field names are part of the wire contract with the storefront client.

use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    pub category_id: Option<i32>,
    pub gender: String,
    pub description: Option<String>,
    pub colors: Vec<Color>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Color {
    pub color_id: i32,
    pub color: String,
    pub image: Option<String>,
    pub sizes: Vec<Size>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Size {
    pub size: String,
    pub quantity: u32,
}
