//! Checkout: order payload construction and submission.
//!
//! Checkout fails closed: every precondition (non-empty cart, delivery
//! location, contact phone, authenticated session) is validated locally
//! before any network traffic, and the cart is cleared only after the backend
//! acknowledges the order.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use khaja_core::{DeliverySlot, Money, OrderId, OrderStatus, PaymentMethod, Phone, ProductId, UserId};

use crate::cart::CartHandle;
use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::storage::StoreError;

/// Path of the order-creation endpoint.
const ORDERS_CREATE_PATH: &str = "/orders/create";

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart holds no items.
    #[error("cannot place an order with an empty cart")]
    EmptyCart,

    /// No delivery location has been chosen.
    #[error("a delivery location is required")]
    MissingLocation,

    /// No contact phone number has been provided.
    #[error("a contact phone number is required")]
    MissingPhone,

    /// No authenticated session is available.
    #[error("sign in to place an order")]
    NotAuthenticated,

    /// The submission itself failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CheckoutError {
    /// Whether this error was caught locally, before any network traffic.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyCart | Self::MissingLocation | Self::MissingPhone | Self::NotAuthenticated
        )
    }
}

// =============================================================================
// Delivery Location
// =============================================================================

/// A chosen delivery location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Human-readable address line shown on the order.
    pub address: String,
}

/// Durable store for the last chosen delivery location.
pub struct LocationStore {
    path: std::path::PathBuf,
}

impl LocationStore {
    /// Create a store backed by the given file path.
    #[must_use]
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Read the persisted location, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read or decoded.
    pub async fn load(&self) -> Result<Option<DeliveryLocation>, StoreError> {
        crate::storage::read_json(&self.path).await
    }

    /// Replace the persisted location.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub async fn save(&self, location: &DeliveryLocation) -> Result<(), StoreError> {
        crate::storage::write_json(&self.path, location, false).await
    }

    /// Remove the persisted location. Succeeds if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be removed.
    pub async fn clear(&self) -> Result<(), StoreError> {
        crate::storage::delete(&self.path).await
    }
}

// =============================================================================
// Order Payload
// =============================================================================

/// Everything the user chooses on the checkout screen.
#[derive(Debug, Clone)]
pub struct CheckoutDetails {
    pub location: Option<DeliveryLocation>,
    pub phone: Option<Phone>,
    pub payment_method: PaymentMethod,
    pub delivery_slot: DeliverySlot,
}

/// Identity fields copied onto the order from the session claims.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderCustomer {
    pub id: UserId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One order line as submitted to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The full order document submitted to the backend.
///
/// Totals are computed server-visibly here so the backend can cross-check
/// them; they are always derived from the same cart snapshot as the lines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderPayload {
    pub user: OrderCustomer,
    pub location: DeliveryLocation,
    pub phone: Phone,
    pub total: Money,
    pub discount: Money,
    #[serde(rename = "finalTotal")]
    pub final_total: Money,
    pub items: Vec<OrderLine>,
    #[serde(rename = "paymentMethod")]
    pub payment_method: PaymentMethod,
    #[serde(rename = "deliveryTime")]
    pub delivery_time: DeliverySlot,
    pub status: OrderStatus,
}

/// Acknowledgement returned by the order-creation endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct OrderReceipt {
    #[serde(rename = "orderId")]
    pub order_id: OrderId,
}

// =============================================================================
// Checkout
// =============================================================================

/// Checkout orchestrator over a gateway and a cart.
#[derive(Clone)]
pub struct Checkout {
    gateway: ApiGateway,
    cart: CartHandle,
}

impl Checkout {
    /// Create a checkout surface over the given gateway and cart.
    #[must_use]
    pub const fn new(gateway: ApiGateway, cart: CartHandle) -> Self {
        Self { gateway, cart }
    }

    /// Validate preconditions and assemble the order document, without any
    /// network traffic.
    ///
    /// Validation order is fixed: empty cart, then location, then phone,
    /// then session. The first failed check wins so the UI always shows the
    /// most actionable problem.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a precondition fails.
    pub async fn build_payload(
        &self,
        details: &CheckoutDetails,
    ) -> Result<OrderPayload, CheckoutError> {
        let cart = self.cart.snapshot().await;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let location = details
            .location
            .clone()
            .ok_or(CheckoutError::MissingLocation)?;
        let phone = details.phone.clone().ok_or(CheckoutError::MissingPhone)?;

        let claims = self
            .gateway
            .session()
            .claims()
            .await
            .ok_or(CheckoutError::NotAuthenticated)?;

        let totals = cart.totals();
        let items = cart
            .items()
            .iter()
            .map(|item| OrderLine {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
            })
            .collect();

        Ok(OrderPayload {
            user: OrderCustomer {
                id: claims.id,
                name: claims.name,
                email: claims.email,
            },
            location,
            phone,
            total: totals.total,
            discount: totals.discount,
            final_total: totals.final_total,
            items,
            payment_method: details.payment_method,
            delivery_time: details.delivery_slot,
            status: OrderStatus::Pending,
        })
    }

    /// Assemble and submit the order, clearing the cart on acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any network traffic when a
    /// precondition fails, or an [`ApiError`] when the submission itself
    /// fails. The cart is left untouched on every error path.
    #[instrument(skip(self, details))]
    pub async fn place_order(
        &self,
        details: &CheckoutDetails,
    ) -> Result<OrderReceipt, CheckoutError> {
        let payload = self.build_payload(details).await?;

        let receipt: OrderReceipt = self.gateway.post(ORDERS_CREATE_PATH, &payload).await?;
        info!(order_id = %receipt.order_id, "order placed");

        self.cart.clear().await;
        Ok(receipt)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use secrecy::SecretString;

    use khaja_core::ProductId;

    use super::*;
    use crate::cart::{CartStore, MemoryCartStore};
    use crate::config::ApiConfig;
    use crate::credentials::MemoryCredentialStore;
    use crate::models::Product;
    use crate::session::{Session, SessionHandle, fake_token};

    fn location() -> DeliveryLocation {
        DeliveryLocation {
            latitude: 27.7172,
            longitude: 85.3240,
            address: "Thamel, Kathmandu".to_owned(),
        }
    }

    fn details() -> CheckoutDetails {
        CheckoutDetails {
            location: Some(location()),
            phone: Some(Phone::parse("9841234567").unwrap()),
            payment_method: PaymentMethod::CashOnDelivery,
            delivery_slot: DeliverySlot::Express,
        }
    }

    fn product(id: &str, rupees: i64) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("product {id}"),
            price: Money::from_rupees(rupees),
            photos: Vec::new(),
            category: None,
            restaurant: None,
            description: None,
        }
    }

    async fn checkout_fixture(authenticated: bool) -> Checkout {
        let session = SessionHandle::new();
        if authenticated {
            let token = fake_token(&serde_json::json!({
                "id": "u-1",
                "name": "Bigyan",
                "email": "bigyan@example.com",
            }));
            session
                .set(
                    Session::new(SecretString::from(token), SecretString::from("r")).unwrap(),
                )
                .await;
        }

        let config = ApiConfig::new(
            "http://localhost:1/api".parse().unwrap(),
            std::env::temp_dir().join("khaja-checkout-test"),
        );
        let gateway = ApiGateway::new(
            &config,
            session,
            Arc::new(MemoryCredentialStore::new()),
        )
        .unwrap();

        let cart = CartHandle::restore(Arc::new(MemoryCartStore::new()) as Arc<dyn CartStore>).await;
        Checkout::new(gateway, cart)
    }

    #[tokio::test]
    async fn test_empty_cart_rejected_before_anything_else() {
        // Even with every other precondition missing too, the empty cart is
        // reported first.
        let checkout = checkout_fixture(false).await;
        let bare = CheckoutDetails {
            location: None,
            phone: None,
            payment_method: PaymentMethod::CashOnDelivery,
            delivery_slot: DeliverySlot::Express,
        };

        let err = checkout.build_payload(&bare).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_validation_order_location_phone_session() {
        let checkout = checkout_fixture(false).await;
        checkout.cart.add(&product("p-1", 100)).await;

        let mut d = details();
        d.location = None;
        assert!(matches!(
            checkout.build_payload(&d).await.unwrap_err(),
            CheckoutError::MissingLocation
        ));

        let mut d = details();
        d.phone = None;
        assert!(matches!(
            checkout.build_payload(&d).await.unwrap_err(),
            CheckoutError::MissingPhone
        ));

        // Everything supplied but no session
        assert!(matches!(
            checkout.build_payload(&details()).await.unwrap_err(),
            CheckoutError::NotAuthenticated
        ));
    }

    #[tokio::test]
    async fn test_payload_totals_and_lines() {
        let checkout = checkout_fixture(true).await;
        let a = product("A", 100);
        let b = product("B", 50);
        checkout.cart.add(&a).await;
        checkout.cart.add(&a).await;
        checkout.cart.add(&b).await;

        let payload = checkout.build_payload(&details()).await.unwrap();

        assert_eq!(payload.total, Money::from_rupees(250));
        assert_eq!(payload.discount, Money::new(Decimal::new(2500, 2)));
        assert_eq!(payload.final_total, Money::new(Decimal::new(22500, 2)));
        assert_eq!(payload.status, OrderStatus::Pending);
        assert_eq!(
            payload.items,
            vec![
                OrderLine {
                    product_id: ProductId::new("A"),
                    quantity: 2
                },
                OrderLine {
                    product_id: ProductId::new("B"),
                    quantity: 1
                },
            ]
        );
        assert_eq!(payload.user.id, UserId::new("u-1"));
        assert_eq!(payload.user.name.as_deref(), Some("Bigyan"));
    }

    #[tokio::test]
    async fn test_payload_wire_shape() {
        let checkout = checkout_fixture(true).await;
        checkout.cart.add(&product("p-1", 180)).await;

        let payload = checkout.build_payload(&details()).await.unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["finalTotal"], "162.00");
        assert_eq!(json["paymentMethod"], "cashondelivery");
        assert_eq!(json["deliveryTime"], "45 min");
        assert_eq!(json["items"][0]["productId"], "p-1");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["phone"], "9841234567");
    }

    #[tokio::test]
    async fn test_validation_failure_never_touches_network() {
        // The gateway points at an unroutable port; reaching the network
        // would surface as an Api error rather than the validation error.
        let checkout = checkout_fixture(true).await;
        let err = checkout.place_order(&details()).await.unwrap_err();
        assert!(matches!(err, CheckoutError::EmptyCart));
    }

    #[tokio::test]
    async fn test_location_store_roundtrip() {
        let path = std::env::temp_dir()
            .join("khaja-location-test")
            .join("location.json");
        let store = LocationStore::new(&path);

        store.save(&location()).await.unwrap();
        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.address, "Thamel, Kathmandu");

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
    }
}
