//! Request filters and the predicates they render to.
//!
//! Every user-supplied value ends up as a bound parameter; the filters only
//! decide which columns are compared and how.

use super::tables::{Categories, ProductColors, Products};
use crate::error::CatalogError;
use sea_query::{Condition, Expr, ExprTrait, Func, IntoColumnRef, Query, SelectStatement};
use std::fmt;

/// The gender vocabulary shared by every endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Men,
    Women,
    Unisex,
}

impl Gender {
    /// Recognise a gender word; case-insensitive on the trimmed input.
    pub fn from_synonym(term: &str) -> Option<Self> {
        match term.trim().to_lowercase().as_str() {
            "men" | "man" | "male" => Some(Gender::Men),
            "women" | "woman" | "female" => Some(Gender::Women),
            "unisex" => Some(Gender::Unisex),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Men => "men",
            Gender::Women => "women",
            Gender::Unisex => "unisex",
        }
    }

    /// Men and women include unisex products; unisex matches only itself.
    pub fn condition(&self) -> Condition {
        match self {
            Gender::Unisex => Condition::any().add(gender_is(Gender::Unisex.as_str())),
            Gender::Men | Gender::Women => unisex_or(self.as_str()),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A free-text search term after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// The term is a gender word and filters by gender.
    Gender(Gender),
    /// Any other term; matched as a lowercase substring.
    Text(String),
}

impl SearchTerm {
    /// Returns `None` for a blank term.
    pub fn classify(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match Gender::from_synonym(trimmed) {
            Some(gender) => SearchTerm::Gender(gender),
            None => SearchTerm::Text(trimmed.to_lowercase()),
        })
    }

    pub fn condition(&self) -> Condition {
        match self {
            SearchTerm::Gender(gender) => gender.condition(),
            SearchTerm::Text(text) => {
                let pattern = contains_pattern(text);
                let category_name = lower((Categories::Table, Categories::Name));
                let categories = category_ids(category_name.like(pattern.as_str()));
                Condition::any()
                    .add(lower((Products::Table, Products::Name)).like(pattern.as_str()))
                    .add(lower((Products::Table, Products::Description)).like(pattern.as_str()))
                    .add(lower((ProductColors::Table, ProductColors::Color)).like(pattern))
                    .add(Expr::col((Products::Table, Products::CategoryId)).in_subquery(categories))
            }
        }
    }
}

/// Filters for the product listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub search_term: Option<String>,
    /// Ignored unless it is a gender word.
    pub gender: Option<String>,
    /// Category id.
    pub category: Option<i32>,
    /// Color name, compared case-insensitively.
    pub color: Option<String>,
}

impl ProductFilter {
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(term) = self.search_term.as_deref().and_then(SearchTerm::classify) {
            condition = condition.add(term.condition());
        }

        if let Some(gender) = self.gender.as_deref().and_then(Gender::from_synonym) {
            condition = condition.add(gender.condition());
        }

        if let Some(category) = self.category {
            condition = condition.add(category_is(category));
        }

        if let Some(color) = non_blank(self.color.as_deref()) {
            condition = condition
                .add(lower((ProductColors::Table, ProductColors::Color)).eq(color.to_lowercase()));
        }

        condition
    }
}

/// A gender the caller asked for, recognised or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestedGender {
    Known(Gender),
    /// Matched literally, still including unisex products.
    Other(String),
}

impl RequestedGender {
    fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(match Gender::from_synonym(trimmed) {
            Some(gender) => RequestedGender::Known(gender),
            None => RequestedGender::Other(trimmed.to_lowercase()),
        })
    }

    pub fn condition(&self) -> Condition {
        match self {
            RequestedGender::Known(gender) => gender.condition(),
            RequestedGender::Other(value) => unisex_or(value),
        }
    }
}

/// Filters for a storefront section. Gender is mandatory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionFilter {
    gender: RequestedGender,
    category: Option<i32>,
}

impl SectionFilter {
    pub fn new(gender: Option<String>, category: Option<i32>) -> Result<Self, CatalogError> {
        let gender = gender
            .as_deref()
            .and_then(RequestedGender::parse)
            .ok_or_else(|| CatalogError::InvalidRequest("Gender is required".to_string()))?;
        Ok(Self { gender, category })
    }

    pub fn gender(&self) -> &RequestedGender {
        &self.gender
    }

    pub fn category(&self) -> Option<i32> {
        self.category
    }

    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all().add(self.gender.condition());
        if let Some(category) = self.category {
            condition = condition.add(category_is(category));
        }
        condition
    }
}

/// Attribute search: color substring, category name and gender.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeSearch {
    pub color: Option<String>,
    /// Category name, compared case-insensitively.
    pub category: Option<String>,
    pub gender: Option<String>,
}

impl AttributeSearch {
    pub fn condition(&self) -> Condition {
        let mut condition = Condition::all();

        if let Some(color) = non_blank(self.color.as_deref()) {
            condition = condition.add(
                lower((ProductColors::Table, ProductColors::Color))
                    .like(contains_pattern(&color.to_lowercase())),
            );
        }

        if let Some(category) = non_blank(self.category.as_deref()) {
            condition = condition.add(
                Expr::col((Products::Table, Products::CategoryId)).in_subquery(category_ids(
                    lower((Categories::Table, Categories::Name)).eq(category.to_lowercase()),
                )),
            );
        }

        if let Some(gender) = self.gender.as_deref().and_then(RequestedGender::parse) {
            condition = condition.add(gender.condition());
        }

        condition
    }
}

fn gender_is(value: &str) -> Expr {
    Expr::col((Products::Table, Products::Gender)).eq(value)
}

fn unisex_or(value: &str) -> Condition {
    Condition::any()
        .add(gender_is(value))
        .add(gender_is(Gender::Unisex.as_str()))
}

fn category_is(category: i32) -> Expr {
    Expr::col((Products::Table, Products::CategoryId)).eq(category)
}

fn lower<C: IntoColumnRef>(column: C) -> Expr {
    Expr::from(Func::lower(Expr::col(column)))
}

fn category_ids(predicate: Expr) -> SelectStatement {
    Query::select()
        .column((Categories::Table, Categories::Id))
        .from(Categories::Table)
        .and_where(predicate)
        .to_owned()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// `%term%` with LIKE metacharacters escaped (backslash is the default escape).
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_query::{Asterisk, PostgresQueryBuilder, Value};

    fn render(condition: Condition) -> (String, Vec<Value>) {
        let (sql, values) = Query::select()
            .column(Asterisk)
            .from(Products::Table)
            .cond_where(condition)
            .to_owned()
            .build(PostgresQueryBuilder);
        (sql, values.0)
    }

    fn string(s: &str) -> Value {
        Value::String(Some(s.to_string()))
    }

    #[test]
    fn test_gender_synonyms() {
        for word in ["men", "Man", " MALE "] {
            assert_eq!(Gender::from_synonym(word), Some(Gender::Men));
        }
        for word in ["women", "Woman", "female"] {
            assert_eq!(Gender::from_synonym(word), Some(Gender::Women));
        }
        assert_eq!(Gender::from_synonym("Unisex"), Some(Gender::Unisex));
        assert_eq!(Gender::from_synonym("kids"), None);
    }

    #[test]
    fn test_unisex_search_term_is_a_gender_filter() {
        assert_eq!(
            SearchTerm::classify("unisex"),
            Some(SearchTerm::Gender(Gender::Unisex))
        );

        let filter = ProductFilter {
            search_term: Some("unisex".to_string()),
            ..Default::default()
        };
        let (sql, values) = render(filter.condition());

        assert!(sql.contains(r#""products"."gender" = $1"#));
        assert!(!sql.contains("LIKE"));
        assert_eq!(values, vec![string("unisex")]);
    }

    #[test]
    fn test_men_includes_unisex() {
        let (sql, values) = render(Gender::Men.condition());
        assert!(sql.contains(" OR "));
        assert_eq!(values, vec![string("men"), string("unisex")]);
    }

    #[test]
    fn test_blank_search_term_is_ignored() {
        assert_eq!(SearchTerm::classify("   "), None);
        assert!(ProductFilter {
            search_term: Some(" ".to_string()),
            ..Default::default()
        }
        .condition()
        .is_empty());
    }

    #[test]
    fn test_text_search_binds_term() {
        let filter = ProductFilter {
            search_term: Some("Robert'); DROP TABLE products;--".to_string()),
            ..Default::default()
        };
        let (sql, values) = render(filter.condition());

        assert!(!sql.contains("DROP"));
        assert!(sql.contains("LOWER("));
        assert!(sql.contains(r#"FROM "categories""#));
        assert_eq!(values.len(), 4);
        assert!(values
            .iter()
            .all(|v| *v == string("%robert'); drop table products;--%")));
    }

    #[test]
    fn test_like_metacharacters_are_escaped() {
        assert_eq!(contains_pattern("50%_off"), r"%50\%\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }

    #[test]
    fn test_unknown_explicit_gender_is_ignored_in_listing() {
        let filter = ProductFilter {
            gender: Some("kids".to_string()),
            ..Default::default()
        };
        assert!(filter.condition().is_empty());
    }

    #[test]
    fn test_listing_filters_combine() {
        let filter = ProductFilter {
            search_term: None,
            gender: Some("female".to_string()),
            category: Some(4),
            color: Some("Red".to_string()),
        };
        let (sql, values) = render(filter.condition());

        assert!(sql.contains(" AND "));
        assert!(sql.contains(r#"LOWER("product_colors"."color") = $4"#));
        assert_eq!(
            values,
            vec![string("women"), string("unisex"), Value::Int(Some(4)), string("red")]
        );
    }

    #[test]
    fn test_section_requires_gender() {
        let err = SectionFilter::new(None, Some(2)).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest(ref m) if m == "Gender is required"));

        let err = SectionFilter::new(Some("  ".to_string()), None).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidRequest(_)));
    }

    #[test]
    fn test_section_unrecognised_gender_still_includes_unisex() {
        let filter = SectionFilter::new(Some("Kids".to_string()), None).unwrap();
        assert_eq!(filter.gender(), &RequestedGender::Other("kids".to_string()));

        let (_, values) = render(filter.condition());
        assert_eq!(values, vec![string("kids"), string("unisex")]);
    }

    #[test]
    fn test_section_with_category() {
        let filter = SectionFilter::new(Some("man".to_string()), Some(3)).unwrap();
        let (sql, values) = render(filter.condition());

        assert!(sql.contains(r#""products"."category_id" = $3"#));
        assert_eq!(values, vec![string("men"), string("unisex"), Value::Int(Some(3))]);
    }

    #[test]
    fn test_attribute_search_resolves_category_by_name() {
        let search = AttributeSearch {
            color: Some("Bl".to_string()),
            category: Some("Shirts".to_string()),
            gender: None,
        };
        let (sql, values) = render(search.condition());

        assert!(sql.contains(r#"IN (SELECT "categories"."id" FROM "categories""#));
        assert_eq!(values, vec![string("%bl%"), string("shirts")]);
    }

    #[test]
    fn test_unknown_category_name_still_constrains() {
        let search = AttributeSearch {
            category: Some("Hovercraft".to_string()),
            ..Default::default()
        };
        let (sql, values) = render(search.condition());

        assert!(sql.contains(r#""products"."category_id" IN (SELECT"#));
        assert_eq!(values, vec![string("hovercraft")]);
    }

    #[test]
    fn test_empty_attribute_search_has_no_predicate() {
        assert!(AttributeSearch::default().condition().is_empty());
    }
}
