//! CLI command implementations.

pub mod auth;
pub mod cart;
pub mod menu;
pub mod order;

use std::sync::Arc;

use khaja_client::cart::FileCartStore;
use khaja_client::credentials::FileCredentialStore;
use khaja_client::{ApiConfig, ApiGateway, AuthClient, CartHandle, CatalogClient, SessionHandle};

/// Everything a command needs: configuration, the gateway, and the shared
/// handles, with session and cart restored from disk.
pub struct Context {
    pub config: ApiConfig,
    pub gateway: ApiGateway,
    pub auth: AuthClient,
    pub catalog: CatalogClient,
    pub cart: CartHandle,
}

impl Context {
    /// Load configuration and rehydrate durable state.
    pub async fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config = ApiConfig::from_env()?;

        let session = SessionHandle::new();
        let credentials = Arc::new(FileCredentialStore::new(config.credentials_path()));
        let gateway = ApiGateway::new(&config, session, credentials)?;

        let auth = AuthClient::new(gateway.clone());
        auth.restore().await?;

        let cart = CartHandle::restore(Arc::new(FileCartStore::new(config.cart_path()))).await;
        let catalog = CatalogClient::new(gateway.clone());

        Ok(Self {
            config,
            gateway,
            auth,
            catalog,
            cart,
        })
    }
}

/// Resolve a password from the flag or the `KHAJA_PASSWORD` environment
/// variable.
pub(crate) fn resolve_password(flag: Option<&str>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(p) = flag {
        return Ok(p.to_owned());
    }
    std::env::var("KHAJA_PASSWORD")
        .map_err(|_| "password required: pass --password or set KHAJA_PASSWORD".into())
}
