//! Order commands: delivery location, order placement, order history.
//!
//! # Usage
//!
//! ```bash
//! khaja location set --lat 27.7172 --lng 85.3240 --address "Thamel, Kathmandu"
//! khaja order place --phone 9841234567 --payment cod --slot 45
//! khaja order history
//! ```

use khaja_client::Checkout;
use khaja_client::checkout::{CheckoutDetails, DeliveryLocation, LocationStore};
use khaja_core::{DeliverySlot, PaymentMethod, Phone};
use tracing::info;

use super::Context;

/// Save the delivery location.
pub async fn set_location(
    lat: f64,
    lng: f64,
    address: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    let store = LocationStore::new(ctx.config.location_path());

    let location = DeliveryLocation {
        latitude: lat,
        longitude: lng,
        address: address.to_owned(),
    };
    store.save(&location).await?;
    info!("Delivery location saved: {address}");
    Ok(())
}

/// Show the saved delivery location.
pub async fn show_location() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    let store = LocationStore::new(ctx.config.location_path());

    match store.load().await? {
        Some(loc) => info!(
            "{} ({:.4}, {:.4})",
            loc.address, loc.latitude, loc.longitude
        ),
        None => info!("No delivery location saved"),
    }
    Ok(())
}

/// Place an order from the current cart.
pub async fn place(
    phone: &str,
    payment: &str,
    slot: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let phone = Phone::parse(phone)?;
    let payment_method: PaymentMethod = payment.parse()?;
    let delivery_slot: DeliverySlot = slot.parse()?;

    let ctx = Context::load().await?;
    let location = LocationStore::new(ctx.config.location_path()).load().await?;

    let checkout = Checkout::new(ctx.gateway.clone(), ctx.cart.clone());
    let receipt = checkout
        .place_order(&CheckoutDetails {
            location,
            phone: Some(phone),
            payment_method,
            delivery_slot,
        })
        .await?;

    info!("Order placed: {}", receipt.order_id);
    Ok(())
}

/// Show the signed-in user's order history.
pub async fn history() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;

    let Some(claims) = ctx.gateway.session().claims().await else {
        return Err("sign in to view order history".into());
    };

    let orders = ctx.catalog.user_orders(&claims.id).await?;
    if orders.is_empty() {
        info!("No past orders");
        return Ok(());
    }

    for order in orders {
        let when = order
            .created_at
            .map_or_else(|| "unknown date".to_owned(), |t| t.to_rfc3339());
        info!("{}  {}  {:?}  {}", order.id, when, order.status, order.total);
    }
    Ok(())
}
