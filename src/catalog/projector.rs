//! Rows → Product/Color/Size tree.
//!
//! The join fans out one row per (product, color, size), and SQL gives no
//! contiguity guarantee without an ORDER BY. The projector groups by key in
//! first-seen order with insertion-ordered maps, so the output is the same for
//! the same input every time.

use super::image::ImagePolicy;
use super::model::{Color, Product, Size};
use super::row::CatalogRow;
use crate::error::CatalogError;
use indexmap::IndexMap;
use rust_decimal::Decimal;

#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;

struct ProductBuilder {
    id: i32,
    name: String,
    price: Decimal,
    category_id: Option<i32>,
    gender: String,
    description: Option<String>,
    colors: IndexMap<i32, ColorBuilder>,
}

struct ColorBuilder {
    color: String,
    image: Option<String>,
    // size label → quantity; the first row for a label wins.
    sizes: IndexMap<String, u32>,
}

impl ProductBuilder {
    fn from_row(row: &CatalogRow) -> Self {
        Self {
            id: row.id,
            name: row.name.clone(),
            price: row.price,
            category_id: row.category_id,
            gender: row.gender.clone(),
            description: row.description.clone(),
            colors: IndexMap::new(),
        }
    }

    fn build(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            price: self.price,
            category_id: self.category_id,
            gender: self.gender,
            description: self.description,
            colors: self
                .colors
                .into_iter()
                .map(|(color_id, color)| color.build(color_id))
                .collect(),
        }
    }
}

impl ColorBuilder {
    fn build(self, color_id: i32) -> Color {
        Color {
            color_id,
            color: self.color,
            image: self.image,
            sizes: self
                .sizes
                .into_iter()
                .map(|(size, quantity)| Size { size, quantity })
                .collect(),
        }
    }
}

/// Builds the nested catalog tree from flattened join rows.
#[derive(Debug, Clone)]
pub struct Projector {
    images: ImagePolicy,
}

impl Projector {
    pub fn new(images: ImagePolicy) -> Self {
        Self { images }
    }

    pub fn image_policy(&self) -> &ImagePolicy {
        &self.images
    }

    /// Group `rows` into products, colors and sizes.
    ///
    /// Products, colors within a product and sizes within a color come out in
    /// the order their first row appeared. A row without a color id adds no
    /// color, and a size on such a row is dropped. Repeated (color, size)
    /// pairs collapse to one entry.
    pub fn project(&self, rows: &[CatalogRow]) -> Vec<Product> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::project_span(rows.len()).entered();

        let mut products: IndexMap<i32, ProductBuilder> = IndexMap::new();

        for row in rows {
            let product = products
                .entry(row.id)
                .or_insert_with(|| ProductBuilder::from_row(row));

            let Some(color_id) = row.color_id else {
                continue;
            };

            let color = product.colors.entry(color_id).or_insert_with(|| ColorBuilder {
                color: row.color.clone().unwrap_or_default(),
                image: self.images.resolve(row.image.as_deref()),
                sizes: IndexMap::new(),
            });

            if let Some(size) = &row.size {
                if !color.sizes.contains_key(size) {
                    color
                        .sizes
                        .insert(size.clone(), row.quantity.unwrap_or_default());
                }
            }
        }

        let products: Vec<Product> = products.into_values().map(ProductBuilder::build).collect();

        #[cfg(feature = "metrics")]
        METRICS.record_projection(products.len());
        log::debug!("projected {} row(s) into {} product(s)", rows.len(), products.len());

        products
    }

    /// Project the rows of a single-product lookup.
    ///
    /// No rows means the product does not exist.
    pub fn project_one(&self, rows: &[CatalogRow]) -> Result<Product, CatalogError> {
        let mut products = self.project(rows).into_iter();
        let product = products
            .next()
            .ok_or_else(|| CatalogError::NotFound("Product not found".to_string()))?;

        if products.next().is_some() {
            return Err(CatalogError::MalformedRow(format!(
                "single-product lookup for {} returned rows for several products",
                product.id
            )));
        }

        Ok(product)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn row(id: i32, color: Option<(i32, &str, &str)>, size: Option<(&str, u32)>) -> CatalogRow {
        CatalogRow {
            id,
            name: format!("Product {id}"),
            price: Decimal::new(1000, 2),
            category_id: Some(3),
            gender: "unisex".to_string(),
            description: Some("cotton".to_string()),
            color_id: color.map(|(c, _, _)| c),
            color: color.map(|(_, name, _)| name.to_string()),
            image: color.map(|(_, _, image)| image.to_string()),
            size: size.map(|(s, _)| s.to_string()),
            quantity: size.map(|(_, q)| q),
        }
    }

    fn projector() -> Projector {
        Projector::new(ImagePolicy::absolute_url("http://x"))
    }

    #[test]
    fn test_tee_scenario() {
        let mut first = row(1, Some((5, "Red", "/u/a.png")), Some(("M", 3)));
        first.name = "Tee".to_string();
        let second = CatalogRow {
            size: Some("L".to_string()),
            quantity: Some(2),
            ..first.clone()
        };
        let third = CatalogRow {
            color_id: Some(6),
            color: Some("Blue".to_string()),
            image: Some("/u/b.png".to_string()),
            size: Some("M".to_string()),
            quantity: Some(1),
            ..first.clone()
        };

        let products = projector().project(&[first, second, third]);

        assert_eq!(products.len(), 1);
        let tee = &products[0];
        assert_eq!(tee.id, 1);
        assert_eq!(tee.name, "Tee");
        assert_eq!(tee.colors.len(), 2);

        let red = &tee.colors[0];
        assert_eq!(red.color, "Red");
        assert_eq!(red.image.as_deref(), Some("http://x/u/a.png"));
        assert_eq!(
            red.sizes,
            vec![
                Size { size: "M".to_string(), quantity: 3 },
                Size { size: "L".to_string(), quantity: 2 },
            ]
        );

        let blue = &tee.colors[1];
        assert_eq!(blue.color, "Blue");
        assert_eq!(blue.image.as_deref(), Some("http://x/u/b.png"));
        assert_eq!(blue.sizes, vec![Size { size: "M".to_string(), quantity: 1 }]);
    }

    #[test]
    fn test_empty_rows() {
        assert!(projector().project(&[]).is_empty());
    }

    #[test]
    fn test_project_one_empty_is_not_found() {
        let err = projector().project_one(&[]).unwrap_err();
        assert!(matches!(err, CatalogError::NotFound(_)));
    }

    #[test]
    fn test_project_one_returns_the_product() {
        let rows = vec![
            row(7, Some((1, "Black", "/u/k.png")), Some(("S", 4))),
            row(7, Some((1, "Black", "/u/k.png")), Some(("M", 0))),
        ];
        let product = projector().project_one(&rows).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.colors[0].sizes.len(), 2);
    }

    #[test]
    fn test_project_one_rejects_several_products() {
        let rows = vec![row(1, None, None), row(2, None, None)];
        let err = projector().project_one(&rows).unwrap_err();
        assert!(matches!(err, CatalogError::MalformedRow(_)));
    }

    #[test]
    fn test_interleaved_rows_keep_first_seen_order() {
        let rows = vec![
            row(2, Some((20, "Green", "/g.png")), Some(("S", 1))),
            row(1, Some((10, "Red", "/r.png")), Some(("M", 1))),
            row(2, Some((21, "White", "/w.png")), Some(("L", 1))),
            row(1, Some((10, "Red", "/r.png")), Some(("S", 1))),
            row(2, Some((20, "Green", "/g.png")), Some(("XL", 1))),
        ];

        let products = projector().project(&rows);

        let ids: Vec<i32> = products.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![2, 1]);

        let colors: Vec<i32> = products[0].colors.iter().map(|c| c.color_id).collect();
        assert_eq!(colors, vec![20, 21]);

        let green_sizes: Vec<&str> = products[0].colors[0]
            .sizes
            .iter()
            .map(|s| s.size.as_str())
            .collect();
        assert_eq!(green_sizes, vec!["S", "XL"]);

        let red_sizes: Vec<&str> = products[1].colors[0]
            .sizes
            .iter()
            .map(|s| s.size.as_str())
            .collect();
        assert_eq!(red_sizes, vec!["M", "S"]);
    }

    #[test]
    fn test_fan_out_duplicates_collapse() {
        let duplicated = row(1, Some((5, "Red", "/u/a.png")), Some(("M", 3)));
        let rows = vec![duplicated.clone(), duplicated.clone(), duplicated];

        let products = projector().project(&rows);

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].colors.len(), 1);
        assert_eq!(
            products[0].colors[0].sizes,
            vec![Size { size: "M".to_string(), quantity: 3 }]
        );
    }

    #[test]
    fn test_first_seen_values_win() {
        let first = row(1, Some((5, "Red", "/u/a.png")), Some(("M", 3)));
        let mut later = first.clone();
        later.name = "Renamed".to_string();
        later.image = Some("/u/other.png".to_string());
        later.quantity = Some(9);

        let products = projector().project(&[first, later]);

        assert_eq!(products[0].name, "Product 1");
        assert_eq!(products[0].colors[0].image.as_deref(), Some("http://x/u/a.png"));
        assert_eq!(products[0].colors[0].sizes[0].quantity, 3);
    }

    #[test]
    fn test_null_color_adds_no_color() {
        let rows = vec![row(1, None, None), row(1, None, Some(("M", 2)))];
        let products = projector().project(&rows);

        assert_eq!(products.len(), 1);
        assert!(products[0].colors.is_empty());
    }

    #[test]
    fn test_color_without_sizes() {
        let products = projector().project(&[row(1, Some((5, "Red", "")), None)]);

        assert_eq!(products[0].colors.len(), 1);
        assert!(products[0].colors[0].sizes.is_empty());
        assert_eq!(products[0].colors[0].image, None);
    }

    #[test]
    fn test_pass_through_policy_applies_to_every_color() {
        let rows = vec![
            row(1, Some((5, "Red", "/u/a.png")), None),
            row(2, Some((6, "Blue", "https://cdn/b.png")), None),
        ];
        let products = Projector::new(ImagePolicy::PassThrough).project(&rows);

        assert_eq!(products[0].colors[0].image.as_deref(), Some("/u/a.png"));
        assert_eq!(products[1].colors[0].image.as_deref(), Some("https://cdn/b.png"));
    }

    #[test]
    fn test_distinct_counts_and_idempotence() {
        let mut rows = Vec::new();
        for product in 1..=4 {
            for color in 0..3 {
                for size in ["S", "M", "L"] {
                    let color_id = product * 10 + color;
                    let r = row(product, Some((color_id, "C", "/c.png")), Some((size, 1)));
                    rows.push(r.clone());
                    if color == 1 {
                        rows.push(r);
                    }
                }
            }
        }
        rows.reverse();

        let first = projector().project(&rows);
        let second = projector().project(&rows);
        assert_eq!(first, second);

        let input_ids: HashSet<i32> = rows.iter().map(|r| r.id).collect();
        let output_ids: HashSet<i32> = first.iter().map(|p| p.id).collect();
        assert_eq!(first.len(), input_ids.len());
        assert_eq!(input_ids, output_ids);

        for product in &first {
            let color_ids: HashSet<i32> = product.colors.iter().map(|c| c.color_id).collect();
            assert_eq!(color_ids.len(), product.colors.len());
            for color in &product.colors {
                let labels: HashSet<&str> = color.sizes.iter().map(|s| s.size.as_str()).collect();
                assert_eq!(labels.len(), color.sizes.len());
                assert_eq!(color.sizes.len(), 3);
            }
        }
    }
}
