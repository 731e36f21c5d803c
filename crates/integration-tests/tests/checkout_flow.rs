//! Integration tests for the cart-to-order flow.

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use rust_decimal::Decimal;

use khaja_client::cart::{CartHandle, CartStore, MemoryCartStore};
use khaja_client::checkout::{CheckoutDetails, CheckoutError, DeliveryLocation};
use khaja_client::credentials::{CredentialStore, MemoryCredentialStore};
use khaja_client::{ApiConfig, AuthClient, ApiGateway, CatalogClient, Checkout, SessionHandle};
use khaja_core::{DeliverySlot, PaymentMethod, Phone};
use khaja_integration_tests::MockBackend;

struct Fixture {
    backend: MockBackend,
    catalog: CatalogClient,
    cart: CartHandle,
    checkout: Checkout,
}

async fn fixture(signed_in: bool) -> Fixture {
    let backend = MockBackend::spawn().await;
    let config = ApiConfig::new(
        backend.base_url().parse().expect("mock backend URL"),
        std::env::temp_dir().join("khaja-checkout-int"),
    );

    let session = SessionHandle::new();
    let gateway = ApiGateway::new(
        &config,
        session,
        Arc::new(MemoryCredentialStore::new()) as Arc<dyn CredentialStore>,
    )
    .expect("gateway");

    if signed_in {
        AuthClient::new(gateway.clone())
            .login("bigyan@example.com", "hunter2!")
            .await
            .expect("login");
    }

    let cart = CartHandle::restore(Arc::new(MemoryCartStore::new()) as Arc<dyn CartStore>).await;
    Fixture {
        backend,
        catalog: CatalogClient::new(gateway.clone()),
        cart: cart.clone(),
        checkout: Checkout::new(gateway, cart),
    }
}

fn details() -> CheckoutDetails {
    CheckoutDetails {
        location: Some(DeliveryLocation {
            latitude: 27.7172,
            longitude: 85.3240,
            address: "Thamel, Kathmandu".to_owned(),
        }),
        phone: Some(Phone::parse("9841234567").expect("phone")),
        payment_method: PaymentMethod::CashOnDelivery,
        delivery_slot: DeliverySlot::Express,
    }
}

fn decimal_field(order: &serde_json::Value, key: &str) -> Decimal {
    Decimal::from_str(order[key].as_str().expect("decimal string")).expect("parse decimal")
}

#[tokio::test]
async fn test_order_submission_carries_cart_derived_totals() {
    let fx = fixture(true).await;

    // Two momos at 180 plus one chowmein at 150, from the live catalog
    let products = fx.catalog.products(None).await.expect("products");
    let momo = products
        .iter()
        .find(|p| p.id.as_str() == "p-momo")
        .expect("momo");
    let chowmein = products
        .iter()
        .find(|p| p.id.as_str() == "p-chowmein")
        .expect("chowmein");
    fx.cart.add(momo).await;
    fx.cart.add(momo).await;
    fx.cart.add(chowmein).await;

    let receipt = fx.checkout.place_order(&details()).await.expect("order");
    assert_eq!(receipt.order_id.as_str(), "ord-1001");

    let order = fx
        .backend
        .state
        .last_order
        .lock()
        .expect("lock")
        .clone()
        .expect("order payload");

    assert_eq!(decimal_field(&order, "total"), Decimal::from(510));
    assert_eq!(decimal_field(&order, "discount"), Decimal::from(51));
    assert_eq!(decimal_field(&order, "finalTotal"), Decimal::from(459));

    assert_eq!(order["user"]["id"], "u-1");
    assert_eq!(order["phone"], "9841234567");
    assert_eq!(order["paymentMethod"], "cashondelivery");
    assert_eq!(order["deliveryTime"], "45 min");
    assert_eq!(order["status"], "pending");

    let items = order["items"].as_array().expect("items");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["productId"], "p-momo");
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[1]["productId"], "p-chowmein");
    assert_eq!(items[1]["quantity"], 1);

    // Acknowledged order empties the cart
    assert!(fx.cart.is_empty().await);
}

#[tokio::test]
async fn test_empty_cart_fails_closed_with_zero_network_traffic() {
    let fx = fixture(true).await;

    let err = fx.checkout.place_order(&details()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert!(err.is_validation());
    assert_eq!(fx.backend.state.order_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_rejected_order_leaves_cart_intact() {
    // Signed out entirely: the session precondition fails and the cart is
    // left untouched
    let fx = fixture(false).await;

    let products = fx.catalog.products(None).await.expect("products");
    fx.cart
        .add(products.first().expect("at least one product"))
        .await;

    let err = fx.checkout.place_order(&details()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::NotAuthenticated));
    assert!(!fx.cart.is_empty().await);
}

#[tokio::test]
async fn test_order_survives_silent_token_expiry() {
    let fx = fixture(true).await;

    let products = fx.catalog.products(None).await.expect("products");
    fx.cart
        .add(products.first().expect("at least one product"))
        .await;

    // The backend rotates its accepted token behind the client's back; the
    // submission recovers transparently
    fx.backend.state.expire_access();

    let receipt = fx.checkout.place_order(&details()).await.expect("order");
    assert_eq!(receipt.order_id.as_str(), "ord-1001");
    assert_eq!(fx.backend.state.refresh_hits.load(Ordering::SeqCst), 1);
    assert!(fx.cart.is_empty().await);
}
