//! Cart commands: add, decrease, remove, show, clear.
//!
//! The cart is a local, persisted collection; every mutation is written back
//! to disk so it survives between invocations.

use khaja_core::ProductId;
use tracing::info;

use super::Context;

/// Add a product to the cart by ID, resolving it from the catalog.
pub async fn add(product_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;

    let wanted = ProductId::new(product_id);
    let products = ctx.catalog.products(None).await?;
    let Some(product) = products.iter().find(|p| p.id == wanted) else {
        return Err(format!("no such product: {product_id}").into());
    };

    ctx.cart.add(product).await;
    info!("Added {} ({})", product.name, product.price);
    Ok(())
}

/// Decrease a product's quantity by one.
pub async fn decrease(product_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    ctx.cart.decrease(&ProductId::new(product_id)).await;
    info!("Decreased {product_id}");
    Ok(())
}

/// Remove a product regardless of quantity.
pub async fn remove(product_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    ctx.cart.remove(&ProductId::new(product_id)).await;
    info!("Removed {product_id}");
    Ok(())
}

/// Show the cart with derived totals.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    let cart = ctx.cart.snapshot().await;

    if cart.is_empty() {
        info!("Cart is empty");
        return Ok(());
    }

    for item in cart.items() {
        info!(
            "{}  {} x{}  = {}",
            item.product_id,
            item.name,
            item.quantity,
            item.line_total()
        );
    }

    let totals = cart.totals();
    info!("Total:    {}", totals.total);
    info!("Discount: {}", totals.discount);
    info!("To pay:   {}", totals.final_total);
    Ok(())
}

/// Empty the cart.
pub async fn clear() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    ctx.cart.clear().await;
    info!("Cart cleared");
    Ok(())
}
