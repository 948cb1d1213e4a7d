//! Catalog products and their display projection.

use rand::Rng;
use rust_decimal::RoundingStrategy;
use serde::{Deserialize, Serialize};
use sportgear_core::{Money, ProductId};

use super::{Timestamp, timestamp};

/// A product as stored by the catalog service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Money,
    pub category: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub in_stock: bool,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "timestamp", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// Product enriched for the catalog view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductDisplay {
    #[serde(flatten)]
    pub product: Product,
    /// Picture chosen by category.
    pub image: &'static str,
    /// Star rating shown on the card.
    pub rating: u8,
    #[serde(rename = "inStock")]
    pub in_stock_flag: bool,
}

impl ProductDisplay {
    /// Build the display form of `product`.
    ///
    /// The catalog has no ratings yet, so one is drawn from `rng` (4 or 5
    /// stars). The shown price is rounded to whole pesos.
    pub fn from_product(mut product: Product, rng: &mut impl Rng) -> Self {
        product.price = product
            .price
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        Self {
            image: category_image(&product.category),
            rating: if rng.random_bool(0.5) { 5 } else { 4 },
            in_stock_flag: product.in_stock,
            product,
        }
    }
}

const IMAGE_FOOTBALL: &str = "https://images.unsplash.com/photo-1587103365297-77661edc549d?fit=max&fm=jpg&q=80&w=1080";
const IMAGE_BASKETBALL: &str = "https://images.unsplash.com/photo-1751010942953-e48cb4b2ccf5?fit=max&fm=jpg&q=80&w=1080";
const IMAGE_FOOTWEAR: &str = "https://images.unsplash.com/photo-1758646119420-12488edce72c?fit=max&fm=jpg&q=80&w=1080";
const IMAGE_FITNESS: &str = "https://images.unsplash.com/photo-1649068618811-9f3547ef98fc?fit=max&fm=jpg&q=80&w=1080";
const IMAGE_TENNIS: &str = "https://images.unsplash.com/photo-1622163642998-1ea32b0bbc67?fit=max&fm=jpg&q=80&w=1080";
const IMAGE_DEFAULT: &str = "https://images.unsplash.com/photo-1587350866945-5aa311427deb?fit=max&fm=jpg&q=80&w=1080";

/// Picture for a catalog category.
#[must_use]
pub fn category_image(category: &str) -> &'static str {
    match category {
        "Football" => IMAGE_FOOTBALL,
        "Basketball" => IMAGE_BASKETBALL,
        "Footwear" => IMAGE_FOOTWEAR,
        "Fitness" => IMAGE_FITNESS,
        "Tennis" => IMAGE_TENNIS,
        _ => IMAGE_DEFAULT,
    }
}

/// Catalog search filters.
///
/// An empty filter set lists the whole catalog; anything else goes through
/// the search endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilters {
    pub query: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub sport: Option<String>,
    pub gender: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub in_stock_only: bool,
}

impl ProductFilters {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Query string pairs for `/api/v1/products/search`.
    #[must_use]
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let text = |key: &'static str, value: &Option<String>| {
            (key, value.as_deref().map(str::trim).unwrap_or_default().to_string())
        };
        let mut pairs = vec![
            text("q", &self.query),
            text("category", &self.category),
            text("brand", &self.brand),
            text("sport", &self.sport),
            text("gender", &self.gender),
        ];
        if let Some(min) = self.min_price {
            pairs.push(("min_price", min.to_string()));
        }
        if let Some(max) = self.max_price {
            pairs.push(("max_price", max.to_string()));
        }
        if self.in_stock_only {
            pairs.push(("in_stock", "true".to_string()));
        }
        pairs.retain(|(_, v)| !v.is_empty());
        pairs
    }
}

/// Body of `POST /api/v1/products`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Money,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sport: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    pub in_stock: bool,
    pub stock_quantity: i64,
}

/// Body of `PUT /api/v1/products/{id}`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        with = "rust_decimal::serde::float_option"
    )]
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_stock: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock_quantity: Option<i64>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use rust_decimal::Decimal;

    use super::*;

    fn product(category: &str) -> Product {
        serde_json::from_value(serde_json::json!({
            "id": 7,
            "name": "Balón Pro",
            "price": 89900.6,
            "category": category,
            "in_stock": true,
            "stock_quantity": 12
        }))
        .unwrap()
    }

    #[test]
    fn test_display_projection() {
        let mut rng = StdRng::seed_from_u64(7);
        let display = ProductDisplay::from_product(product("Football"), &mut rng);
        assert_eq!(display.image, IMAGE_FOOTBALL);
        assert!(display.in_stock_flag);
        assert!((4..=5).contains(&display.rating));
        assert_eq!(display.product.price, Decimal::new(89_901, 0));

        let json = serde_json::to_value(&display).unwrap();
        assert_eq!(json["inStock"], serde_json::json!(true));
        assert_eq!(json["in_stock"], serde_json::json!(true));
    }

    #[test]
    fn test_unknown_category_uses_default_image() {
        assert_eq!(category_image("Cycling"), IMAGE_DEFAULT);
    }

    #[test]
    fn test_filters_to_query() {
        let filters = ProductFilters {
            query: Some(" balón ".to_string()),
            category: Some(String::new()),
            min_price: Some(Decimal::new(10_000, 0)),
            in_stock_only: true,
            ..ProductFilters::default()
        };
        assert!(!filters.is_empty());
        assert_eq!(
            filters.to_query(),
            vec![
                ("q", "balón".to_string()),
                ("min_price", "10000".to_string()),
                ("in_stock", "true".to_string()),
            ]
        );
        assert!(ProductFilters::default().is_empty());
    }
}
