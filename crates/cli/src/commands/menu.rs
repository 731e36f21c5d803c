//! Browse commands: products, restaurants, categories, search.

use khaja_client::models::SearchKind;
use tracing::info;

use super::Context;

fn parse_kind(s: &str) -> Result<SearchKind, Box<dyn std::error::Error>> {
    match s {
        "product" => Ok(SearchKind::Product),
        "restaurant" => Ok(SearchKind::Restaurant),
        other => Err(format!("invalid search type: {other} (use product or restaurant)").into()),
    }
}

/// List products, optionally filtered by category.
pub async fn products(category: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    let products = ctx.catalog.products(category).await?;

    if products.is_empty() {
        info!("No products found");
        return Ok(());
    }
    for p in products.iter() {
        info!("{}  {}  {}", p.id, p.price, p.name);
    }
    Ok(())
}

/// List restaurants.
pub async fn restaurants() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    for r in ctx.catalog.restaurants().await?.iter() {
        info!(
            "{}  {}  {}",
            r.id,
            r.name,
            r.address.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

/// Show one restaurant's menu.
pub async fn restaurant(name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    let menu = ctx.catalog.restaurant_menu(name).await?;

    match &menu.restaurant {
        Some(r) => info!("{}", r.name),
        None => info!("Restaurant not found: {name}"),
    }
    for p in &menu.products {
        info!("  {}  {}  {}", p.id, p.price, p.name);
    }
    Ok(())
}

/// List product categories.
pub async fn categories() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    for c in ctx.catalog.categories().await?.iter() {
        info!("{}  {}", c.id, c.name);
    }
    Ok(())
}

/// Search products or restaurants.
pub async fn search(query: &str, kind: &str) -> Result<(), Box<dyn std::error::Error>> {
    let kind = parse_kind(kind)?;
    let ctx = Context::load().await?;
    let results = ctx.catalog.search(query, kind).await?;

    if results.is_empty() {
        info!("No results for \"{query}\"");
        return Ok(());
    }
    for p in &results.products {
        info!("{}  {}  {}", p.id, p.price, p.name);
    }
    for r in &results.restaurants {
        info!("{}  {}", r.id, r.name);
    }
    Ok(())
}
