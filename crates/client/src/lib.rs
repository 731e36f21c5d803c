//! Khaja client core.
//!
//! This crate implements the non-UI heart of the Khaja food-ordering client:
//!
//! - [`gateway`] - Authenticated API gateway with a one-shot
//!   refresh-and-retry recovery protocol for expired access tokens
//! - [`session`] - Process-wide session holder and decoded token claims
//! - [`credentials`] - Durable credential store contract and implementations
//! - [`cart`] - Persisted cart aggregate with derived totals and discount
//! - [`checkout`] - Order payload construction and submission (fails closed)
//! - [`catalog`] - Cached data-fetching surface for menus and restaurants
//! - [`auth`] - Login, registration, logout, and account management
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use khaja_client::{ApiConfig, ApiGateway, AuthClient, SessionHandle};
//! use khaja_client::credentials::FileCredentialStore;
//!
//! let config = ApiConfig::from_env()?;
//! let session = SessionHandle::new();
//! let store = Arc::new(FileCredentialStore::new(config.credentials_path()));
//! let gateway = ApiGateway::new(&config, session.clone(), store)?;
//!
//! let auth = AuthClient::new(gateway.clone());
//! auth.login("user@example.com", "hunter2!").await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod credentials;
pub mod error;
pub mod gateway;
pub mod models;
pub mod session;
mod storage;

pub use auth::AuthClient;
pub use cart::CartHandle;
pub use catalog::CatalogClient;
pub use checkout::Checkout;
pub use config::ApiConfig;
pub use error::ApiError;
pub use gateway::ApiGateway;
pub use session::SessionHandle;
