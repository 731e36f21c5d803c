//! Cached data-fetching surface for catalog content.
//!
//! Public catalog reads (products, restaurants, categories, carousel) are
//! cached in-process with a short TTL so screen navigation does not hammer
//! the backend. Search and everything user-scoped (favourites, order
//! history) always hit the backend.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;
use tracing::{debug, instrument};

use khaja_core::UserId;

use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::models::{
    CarouselSlide, Category, Favourite, OrderSummary, Product, Restaurant, RestaurantMenu,
    SearchKind, SearchResults,
};

/// How long cached catalog reads stay fresh.
const CACHE_TTL: Duration = Duration::from_secs(60);

/// Maximum number of cached catalog entries.
const CACHE_CAPACITY: u64 = 256;

/// Cached payloads, keyed by endpoint-and-argument strings.
#[derive(Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Restaurants(Arc<Vec<Restaurant>>),
    Menu(Arc<RestaurantMenu>),
    Categories(Arc<Vec<Category>>),
    Carousel(Arc<Vec<CarouselSlide>>),
}

// =============================================================================
// Response Envelopes
// =============================================================================

#[derive(Deserialize)]
struct ProductsEnvelope {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Deserialize)]
struct RestaurantsEnvelope {
    #[serde(default)]
    restaurants: Vec<Restaurant>,
}

#[derive(Deserialize)]
struct CategoriesEnvelope {
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Deserialize)]
struct CarouselEnvelope {
    #[serde(rename = "carouselList", default)]
    carousel_list: Vec<CarouselSlide>,
}

#[derive(Deserialize)]
struct FavouritesEnvelope {
    #[serde(default)]
    favourites: Vec<Favourite>,
}

#[derive(Deserialize)]
struct OrdersEnvelope {
    #[serde(default)]
    orders: Vec<OrderSummary>,
}

/// Favourites resolved to their full product/restaurant documents.
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct ResolvedFavourites {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub restaurants: Vec<Restaurant>,
}

// =============================================================================
// CatalogClient
// =============================================================================

/// Read surface for menus, restaurants, search, favourites, and order
/// history.
///
/// Cheap to clone; all clones share one cache and gateway.
#[derive(Clone)]
pub struct CatalogClient {
    gateway: ApiGateway,
    cache: Cache<String, CacheValue>,
}

impl CatalogClient {
    /// Create a catalog client over the given gateway.
    #[must_use]
    pub fn new(gateway: ApiGateway) -> Self {
        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();
        Self { gateway, cache }
    }

    // =========================================================================
    // Public Catalog (cached)
    // =========================================================================

    /// List products, optionally filtered by category.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, category: Option<&str>) -> Result<Arc<Vec<Product>>, ApiError> {
        let key = match category {
            Some(c) => format!("products:{c}"),
            None => "products".to_owned(),
        };

        if let Some(CacheValue::Products(products)) = self.cache.get(&key).await {
            debug!(key = %key, "cache hit");
            return Ok(products);
        }

        let envelope: ProductsEnvelope = match category {
            Some(c) => {
                self.gateway
                    .get_public_with_query("/product", &[("category", c)])
                    .await?
            }
            None => self.gateway.get_public("/product").await?,
        };

        let products = Arc::new(envelope.products);
        self.cache
            .insert(key, CacheValue::Products(Arc::clone(&products)))
            .await;
        Ok(products)
    }

    /// List all restaurants.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn restaurants(&self) -> Result<Arc<Vec<Restaurant>>, ApiError> {
        let key = "restaurants".to_owned();
        if let Some(CacheValue::Restaurants(restaurants)) = self.cache.get(&key).await {
            debug!("cache hit");
            return Ok(restaurants);
        }

        let envelope: RestaurantsEnvelope = self.gateway.get_public("/restaurant").await?;
        let restaurants = Arc::new(envelope.restaurants);
        self.cache
            .insert(key, CacheValue::Restaurants(Arc::clone(&restaurants)))
            .await;
        Ok(restaurants)
    }

    /// Fetch one restaurant together with its menu, addressed by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn restaurant_menu(&self, name: &str) -> Result<Arc<RestaurantMenu>, ApiError> {
        let key = format!("menu:{name}");
        if let Some(CacheValue::Menu(menu)) = self.cache.get(&key).await {
            debug!(restaurant = %name, "cache hit");
            return Ok(menu);
        }

        let path = format!("/restaurant/{}", urlencoding::encode(name));
        let menu: RestaurantMenu = self.gateway.get_public(&path).await?;
        let menu = Arc::new(menu);
        self.cache
            .insert(key, CacheValue::Menu(Arc::clone(&menu)))
            .await;
        Ok(menu)
    }

    /// List product categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn categories(&self) -> Result<Arc<Vec<Category>>, ApiError> {
        let key = "categories".to_owned();
        if let Some(CacheValue::Categories(categories)) = self.cache.get(&key).await {
            debug!("cache hit");
            return Ok(categories);
        }

        let envelope: CategoriesEnvelope = self.gateway.get_public("/category").await?;
        let categories = Arc::new(envelope.categories);
        self.cache
            .insert(key, CacheValue::Categories(Arc::clone(&categories)))
            .await;
        Ok(categories)
    }

    /// Fetch the home-screen carousel.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn carousel(&self) -> Result<Arc<Vec<CarouselSlide>>, ApiError> {
        let key = "carousel".to_owned();
        if let Some(CacheValue::Carousel(slides)) = self.cache.get(&key).await {
            debug!("cache hit");
            return Ok(slides);
        }

        let envelope: CarouselEnvelope = self.gateway.get_public("/carousel").await?;
        let slides = Arc::new(envelope.carousel_list);
        self.cache
            .insert(key, CacheValue::Carousel(Arc::clone(&slides)))
            .await;
        Ok(slides)
    }

    /// Search products and/or restaurants. Never cached, every keystroke is
    /// a fresh query.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, kind: SearchKind) -> Result<SearchResults, ApiError> {
        self.gateway
            .get_public_with_query("/search", &[("query", query), ("type", kind.as_str())])
            .await
    }

    // =========================================================================
    // User-Scoped Reads & Writes (authenticated, never cached)
    // =========================================================================

    /// List the user's saved favourite references.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session cannot be
    /// recovered after a 401.
    pub async fn favourites(&self, user_id: &UserId) -> Result<Vec<Favourite>, ApiError> {
        let envelope: FavouritesEnvelope = self
            .gateway
            .get_with_query("/favourites", &[("userId", user_id.as_str())])
            .await?;
        Ok(envelope.favourites)
    }

    /// List the user's favourites resolved to full product/restaurant
    /// documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session cannot be
    /// recovered after a 401.
    pub async fn favourites_full(&self, user_id: &UserId) -> Result<ResolvedFavourites, ApiError> {
        self.gateway
            .get_with_query("/favourites/full", &[("userId", user_id.as_str())])
            .await
    }

    /// Toggle an item in the user's favourites.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session cannot be
    /// recovered after a 401.
    #[instrument(skip(self))]
    pub async fn add_favourite(
        &self,
        user_id: &UserId,
        item_id: &str,
        kind: SearchKind,
    ) -> Result<(), ApiError> {
        let body = serde_json::json!({
            "userId": user_id.as_str(),
            "itemId": item_id,
            "type": kind.as_str(),
        });
        let _: serde_json::Value = self.gateway.post("/favourites/add", &body).await?;
        Ok(())
    }

    /// Fetch the user's order history.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session cannot be
    /// recovered after a 401.
    pub async fn user_orders(&self, user_id: &UserId) -> Result<Vec<OrderSummary>, ApiError> {
        let path = format!("/orders/user/{}", urlencoding::encode(user_id.as_str()));
        let envelope: OrdersEnvelope = self.gateway.get(&path).await?;
        Ok(envelope.orders)
    }
}
