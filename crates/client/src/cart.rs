//! Cart aggregate: the set of products the user intends to order, with
//! derived pricing consumed by checkout.
//!
//! The pure aggregate lives in [`Cart`]; [`CartHandle`] wraps it in a shared,
//! persisted handle. Mutations hold the write lock across the persistence
//! write, so durable records always land in mutation order. None of the
//! cart's own operations can fail.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::warn;

use khaja_core::{Money, ProductId};

use crate::models::Product;
pub use crate::storage::StoreError;

/// Fixed cart-level discount applied to the total (10%).
const DISCOUNT_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

// =============================================================================
// Aggregate
// =============================================================================

/// One product and its requested quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub product_id: ProductId,
    /// Display metadata, passed through opaquely.
    pub name: String,
    pub unit_price: Money,
    #[serde(default)]
    pub image: Option<String>,
    /// Always >= 1 while the item exists; a decrement to 0 removes the item.
    pub quantity: u32,
}

impl CartItem {
    /// Price x quantity for this line.
    #[must_use]
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Derived pricing figures, recomputed fresh on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartTotals {
    /// Sum over all items of price x quantity.
    pub total: Money,
    /// Fixed-percentage reduction applied to the total.
    pub discount: Money,
    /// `total - discount`.
    pub final_total: Money,
}

/// The in-memory cart collection.
///
/// Items are keyed by product ID (unique) with insertion order preserved for
/// stable display; order is irrelevant to totals.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a product: increments quantity if already present, otherwise
    /// inserts with quantity 1. Never fails.
    pub fn add(&mut self, product: &Product) {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.id)
        {
            item.quantity += 1;
            return;
        }

        self.items.push(CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            image: product.photos.first().cloned(),
            quantity: 1,
        });
    }

    /// Decrease a product's quantity by 1, removing the item entirely when
    /// the quantity is 1. No-op if the product is absent.
    pub fn decrease(&mut self, product_id: &ProductId) {
        let Some(pos) = self.items.iter().position(|i| &i.product_id == product_id) else {
            return;
        };

        match self.items.get_mut(pos) {
            Some(item) if item.quantity > 1 => item.quantity -= 1,
            _ => {
                self.items.remove(pos);
            }
        }
    }

    /// Remove an item unconditionally regardless of quantity. No-op if
    /// absent.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.items.retain(|i| &i.product_id != product_id);
    }

    /// Empty the entire collection.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// The items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of price x quantity over all items. Recomputed on every read so
    /// it can never go stale against the current contents.
    #[must_use]
    pub fn total(&self) -> Money {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// All three derived figures in one read.
    ///
    /// The discount is rounded to two decimal places so every figure stays
    /// at paisa precision on the wire.
    #[must_use]
    pub fn totals(&self) -> CartTotals {
        let total = self.total();
        let discount = Money::new((total.amount() * DISCOUNT_RATE).round_dp(2));
        CartTotals {
            total,
            discount,
            final_total: total - discount,
        }
    }
}

// =============================================================================
// Persistence
// =============================================================================

/// Contract for durable cart persistence: one named record, read once at
/// startup, written after every mutation.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Read the persisted collection, if any.
    async fn load(&self) -> Result<Option<Cart>, StoreError>;

    /// Replace the persisted collection.
    async fn save(&self, cart: &Cart) -> Result<(), StoreError>;
}

/// File-backed cart store (one JSON record).
pub struct FileCartStore {
    path: std::path::PathBuf,
}

impl FileCartStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CartStore for FileCartStore {
    async fn load(&self) -> Result<Option<Cart>, StoreError> {
        crate::storage::read_json(&self.path).await
    }

    async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        crate::storage::write_json(&self.path, cart, false).await
    }
}

/// In-memory cart store for tests.
#[derive(Default)]
pub struct MemoryCartStore {
    cart: RwLock<Option<Cart>>,
}

impl MemoryCartStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn load(&self) -> Result<Option<Cart>, StoreError> {
        Ok(self.cart.read().await.clone())
    }

    async fn save(&self, cart: &Cart) -> Result<(), StoreError> {
        *self.cart.write().await = Some(cart.clone());
        Ok(())
    }
}

// =============================================================================
// Shared Handle
// =============================================================================

/// Shared, persisted cart handle.
///
/// Cheap to clone; all clones observe the same collection. Every mutation is
/// followed by a persistence write performed while the write lock is still
/// held, so overlapping mutations cannot persist out of order and the
/// durable record always matches the last in-memory state. A failed write is
/// logged and swallowed because cart operations never fail - the in-memory
/// state stays authoritative for the running session.
#[derive(Clone)]
pub struct CartHandle {
    cart: Arc<RwLock<Cart>>,
    store: Arc<dyn CartStore>,
}

impl CartHandle {
    /// Restore the cart from its durable record, starting empty when none
    /// exists (or the record is unreadable).
    pub async fn restore(store: Arc<dyn CartStore>) -> Self {
        let cart = match store.load().await {
            Ok(Some(cart)) => cart,
            Ok(None) => Cart::new(),
            Err(e) => {
                warn!(error = %e, "failed to restore persisted cart, starting empty");
                Cart::new()
            }
        };

        Self {
            cart: Arc::new(RwLock::new(cart)),
            store,
        }
    }

    /// Add a product (insert at quantity 1 or increment).
    pub async fn add(&self, product: &Product) {
        let mut cart = self.cart.write().await;
        cart.add(product);
        self.persist(&cart).await;
    }

    /// Decrease a product's quantity (remove at quantity 1).
    pub async fn decrease(&self, product_id: &ProductId) {
        let mut cart = self.cart.write().await;
        cart.decrease(product_id);
        self.persist(&cart).await;
    }

    /// Remove an item unconditionally.
    pub async fn remove(&self, product_id: &ProductId) {
        let mut cart = self.cart.write().await;
        cart.remove(product_id);
        self.persist(&cart).await;
    }

    /// Empty the cart (after successful order submission, or explicitly).
    pub async fn clear(&self) {
        let mut cart = self.cart.write().await;
        cart.clear();
        self.persist(&cart).await;
    }

    /// A point-in-time copy of the collection.
    pub async fn snapshot(&self) -> Cart {
        self.cart.read().await.clone()
    }

    /// Derived pricing figures for the current contents.
    pub async fn totals(&self) -> CartTotals {
        self.cart.read().await.totals()
    }

    /// Whether the cart holds no items.
    pub async fn is_empty(&self) -> bool {
        self.cart.read().await.is_empty()
    }

    async fn persist(&self, snapshot: &Cart) {
        if let Err(e) = self.store.save(snapshot).await {
            warn!(error = %e, "failed to persist cart");
        }
    }
}
