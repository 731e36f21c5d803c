//! Khaja CLI - browse the menu, manage a cart, and place orders from the
//! terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in
//! khaja auth login -e user@example.com
//!
//! # Browse
//! khaja menu products --category Momo
//! khaja menu restaurants
//! khaja menu search momo
//!
//! # Build a cart and order
//! khaja cart add <product-id>
//! khaja location set --lat 27.7172 --lng 85.3240 --address "Thamel, Kathmandu"
//! khaja order place --phone 9841234567
//! ```
//!
//! # Commands
//!
//! - `auth` - Sign in, register, sign out, show the current session
//! - `menu` - Browse products, restaurants, categories, and search
//! - `cart` - Manage the persisted cart
//! - `location` - Manage the saved delivery location
//! - `order` - Place orders and view order history

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "khaja")]
#[command(author, version, about = "Khaja food-ordering CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in, register, sign out, show the current session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Browse products, restaurants, categories, and search
    Menu {
        #[command(subcommand)]
        action: MenuAction,
    },
    /// Manage the persisted cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage the saved delivery location
    Location {
        #[command(subcommand)]
        action: LocationAction,
    },
    /// Place orders and view order history
    Order {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Sign in with email and password
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,

        /// Account password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create a new account
    Register {
        /// Display name
        #[arg(short, long)]
        name: String,

        /// Email address
        #[arg(short, long)]
        email: String,

        /// Mobile number (10 digits, 98/97/96 prefix)
        #[arg(long)]
        phone: String,

        /// Account password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Sign out and remove stored credentials
    Logout,
    /// Show the current session, restoring it from disk if needed
    Whoami,
}

#[derive(Subcommand)]
enum MenuAction {
    /// List products, optionally filtered by category
    Products {
        /// Category name to filter by
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List restaurants
    Restaurants,
    /// Show one restaurant's menu
    Restaurant {
        /// Restaurant name
        name: String,
    },
    /// List product categories
    Categories,
    /// Search products or restaurants
    Search {
        /// Search text
        query: String,

        /// What to search: `product` or `restaurant`
        #[arg(short = 't', long = "type", default_value = "product")]
        kind: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product to the cart (by product ID)
    Add {
        /// Product ID as shown by `menu products`
        product_id: String,
    },
    /// Decrease a product's quantity by one
    Decrease {
        /// Product ID
        product_id: String,
    },
    /// Remove a product regardless of quantity
    Remove {
        /// Product ID
        product_id: String,
    },
    /// Show the cart with totals
    Show,
    /// Empty the cart
    Clear,
}

#[derive(Subcommand)]
enum LocationAction {
    /// Save the delivery location
    Set {
        /// Latitude
        #[arg(long)]
        lat: f64,

        /// Longitude
        #[arg(long)]
        lng: f64,

        /// Address line shown on the order
        #[arg(short, long)]
        address: String,
    },
    /// Show the saved delivery location
    Show,
}

#[derive(Subcommand)]
enum OrderAction {
    /// Place an order from the current cart
    Place {
        /// Contact mobile number
        #[arg(long)]
        phone: String,

        /// Payment method: `cod` or `khalti`
        #[arg(long, default_value = "cod")]
        payment: String,

        /// Delivery slot: `45`, `1h`, or `2h`
        #[arg(long, default_value = "45")]
        slot: String,
    },
    /// Show the signed-in user's order history
    History,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Auth { action } => match action {
            AuthAction::Login { email, password } => {
                commands::auth::login(&email, password.as_deref()).await?;
            }
            AuthAction::Register {
                name,
                email,
                phone,
                password,
            } => {
                commands::auth::register(&name, &email, &phone, password.as_deref()).await?;
            }
            AuthAction::Logout => commands::auth::logout().await?,
            AuthAction::Whoami => commands::auth::whoami().await?,
        },
        Commands::Menu { action } => match action {
            MenuAction::Products { category } => {
                commands::menu::products(category.as_deref()).await?;
            }
            MenuAction::Restaurants => commands::menu::restaurants().await?,
            MenuAction::Restaurant { name } => commands::menu::restaurant(&name).await?,
            MenuAction::Categories => commands::menu::categories().await?,
            MenuAction::Search { query, kind } => commands::menu::search(&query, &kind).await?,
        },
        Commands::Cart { action } => match action {
            CartAction::Add { product_id } => commands::cart::add(&product_id).await?,
            CartAction::Decrease { product_id } => commands::cart::decrease(&product_id).await?,
            CartAction::Remove { product_id } => commands::cart::remove(&product_id).await?,
            CartAction::Show => commands::cart::show().await?,
            CartAction::Clear => commands::cart::clear().await?,
        },
        Commands::Location { action } => match action {
            LocationAction::Set { lat, lng, address } => {
                commands::order::set_location(lat, lng, &address).await?;
            }
            LocationAction::Show => commands::order::show_location().await?,
        },
        Commands::Order { action } => match action {
            OrderAction::Place {
                phone,
                payment,
                slot,
            } => commands::order::place(&phone, &payment, &slot).await?,
            OrderAction::History => commands::order::history().await?,
        },
    }
    Ok(())
}
