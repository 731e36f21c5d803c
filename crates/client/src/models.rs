//! Wire schemas for catalog and account data.
//!
//! The backend keys documents by `_id` and uses camelCase field names;
//! display metadata (names, photo URLs) is passed through opaquely.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use khaja_core::{CategoryId, Money, OrderId, OrderStatus, ProductId, RestaurantId, UserId};

/// A product as listed on menu and search screens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub price: Money,
    /// Photo URLs, first one used as the card image.
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub restaurant: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// A restaurant as listed on the home screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Restaurant {
    #[serde(rename = "_id")]
    pub id: RestaurantId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// A restaurant together with its menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RestaurantMenu {
    #[serde(default)]
    pub restaurant: Option<Restaurant>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// A product category tile.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// A home-screen carousel slide.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CarouselSlide {
    #[serde(rename = "_id")]
    pub id: String,
    pub image: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// What a search query matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Product,
    Restaurant,
}

impl SearchKind {
    /// Wire value of the `type` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Restaurant => "restaurant",
        }
    }
}

/// Results of a search query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SearchResults {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
}

impl SearchResults {
    /// Whether nothing matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty() && self.restaurants.is_empty()
    }
}

/// A saved favourite (product or restaurant reference).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Favourite {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One line of a past order as returned by the order-history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderHistoryLine {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A past order as shown on the order-history screen.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderSummary {
    #[serde(rename = "_id")]
    pub id: OrderId,
    pub total: Money,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub items: Vec<OrderHistoryLine>,
    #[serde(rename = "createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_product_decodes_backend_shape() {
        let json = serde_json::json!({
            "_id": "p-1",
            "name": "Chicken Momo",
            "price": "180.00",
            "photos": ["https://cdn.example.com/momo.jpg"],
            "category": "Momo",
        });
        let product: Product = serde_json::from_value(json).unwrap();
        assert_eq!(product.id, ProductId::new("p-1"));
        assert_eq!(product.price, Money::from_rupees(180));
        assert!(product.restaurant.is_none());
    }

    #[test]
    fn test_search_results_tolerate_partial_payloads() {
        let results: SearchResults = serde_json::from_value(serde_json::json!({
            "products": [],
        }))
        .unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_order_summary_defaults() {
        let order: OrderSummary = serde_json::from_value(serde_json::json!({
            "_id": "o-9",
            "total": "430.00",
        }))
        .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.items.is_empty());
        assert!(order.created_at.is_none());
    }
}
