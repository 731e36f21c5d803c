//! Integration tests for the gateway's 401 recovery protocol.
//!
//! Each test runs against an in-process mock backend with instrumented
//! token state, so expiry and refresh failure can be forced deterministically.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use secrecy::SecretString;
use serde_json::Value;

use khaja_client::credentials::{CredentialStore, MemoryCredentialStore, TokenPair};
use khaja_client::{ApiConfig, ApiError, ApiGateway, SessionHandle};
use khaja_integration_tests::{MockBackend, REFRESH_TOKEN, fake_jwt};

fn config(base_url: &str) -> ApiConfig {
    ApiConfig::new(
        base_url.parse().expect("mock backend URL"),
        std::env::temp_dir().join("khaja-gateway-int"),
    )
}

fn stack(backend: &MockBackend) -> (ApiGateway, SessionHandle, Arc<MemoryCredentialStore>) {
    let session = SessionHandle::new();
    let store = Arc::new(MemoryCredentialStore::new());
    let gateway = ApiGateway::new(
        &config(backend.base_url()),
        session.clone(),
        Arc::clone(&store) as Arc<dyn CredentialStore>,
    )
    .expect("gateway");
    (gateway, session, store)
}

/// A token pair whose access token the backend no longer accepts.
fn stale_pair() -> TokenPair {
    TokenPair {
        access_token: SecretString::from(fake_jwt("u-1", "bigyan", 9999)),
        refresh_token: SecretString::from(REFRESH_TOKEN),
    }
}

#[tokio::test]
async fn test_expired_token_refreshes_and_retries_transparently() {
    let backend = MockBackend::spawn().await;
    let (gateway, session, store) = stack(&backend);
    store.save(&stale_pair()).await.expect("seed store");

    let result: Result<Value, ApiError> = gateway.get("/orders/user/u-1").await;
    assert!(result.is_ok(), "caller should never observe the 401");

    // One refresh, original dispatch plus one retry
    assert_eq!(backend.state.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(backend.state.protected_hits.load(Ordering::SeqCst), 2);

    // The rotated token was persisted and installed in the session
    let saved = store.get().await.expect("store").expect("tokens");
    assert_eq!(
        secrecy::ExposeSecret::expose_secret(&saved.access_token),
        backend.state.current_access()
    );
    assert!(session.is_authenticated().await);
}

#[tokio::test]
async fn test_valid_token_never_triggers_refresh() {
    let backend = MockBackend::spawn().await;
    let (gateway, _session, store) = stack(&backend);
    store
        .save(&TokenPair {
            access_token: SecretString::from(backend.state.current_access()),
            refresh_token: SecretString::from(REFRESH_TOKEN),
        })
        .await
        .expect("seed store");

    let result: Result<Value, ApiError> = gateway.get("/orders/user/u-1").await;
    assert!(result.is_ok());
    assert_eq!(backend.state.refresh_hits.load(Ordering::SeqCst), 0);
    assert_eq!(backend.state.protected_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_failed_refresh_tears_down_session() {
    let backend = MockBackend::spawn().await;
    backend.state.break_refresh();

    let (gateway, session, store) = stack(&backend);
    store.save(&stale_pair()).await.expect("seed store");

    let result: Result<Value, ApiError> = gateway.get("/orders/user/u-1").await;
    assert!(matches!(result, Err(ApiError::SessionExpired)));

    // Credentials purged, session cleared, no retry of the original request
    assert!(store.get().await.expect("store").is_none());
    assert!(!session.is_authenticated().await);
    assert_eq!(backend.state.protected_hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_missing_credentials_terminate_without_refresh_call() {
    let backend = MockBackend::spawn().await;
    let (gateway, session, store) = stack(&backend);
    // Store left empty: the 401 has nothing to recover with

    let result: Result<Value, ApiError> = gateway.get("/orders/user/u-1").await;
    assert!(matches!(result, Err(ApiError::SessionExpired)));
    assert_eq!(backend.state.refresh_hits.load(Ordering::SeqCst), 0);
    assert!(store.get().await.expect("store").is_none());
    assert!(!session.is_authenticated().await);
}

#[tokio::test]
async fn test_second_401_after_successful_refresh_propagates() {
    let backend = MockBackend::spawn().await;
    let (gateway, _session, store) = stack(&backend);
    store.save(&stale_pair()).await.expect("seed store");

    // The route rejects even the rotated token; recovery must not loop
    let result: Result<Value, ApiError> = gateway.get("/always-401").await;
    match result {
        Err(ApiError::Server { status, .. }) => assert_eq!(status.as_u16(), 401),
        other => panic!("expected Server 401, got {other:?}"),
    }

    assert_eq!(backend.state.refresh_hits.load(Ordering::SeqCst), 1);
    assert_eq!(backend.state.protected_hits.load(Ordering::SeqCst), 2);
    // A successful refresh is not a teardown, credentials stay usable
    assert!(store.get().await.expect("store").is_some());
}

#[tokio::test]
async fn test_public_requests_bypass_recovery() {
    let backend = MockBackend::spawn().await;
    let (gateway, _session, _store) = stack(&backend);

    // 401 from a skip-auth request propagates untouched
    let result: Result<Value, ApiError> = gateway.get_public("/orders/user/u-1").await;
    match result {
        Err(ApiError::Server { status, .. }) => assert_eq!(status.as_u16(), 401),
        other => panic!("expected Server 401, got {other:?}"),
    }
    assert_eq!(backend.state.refresh_hits.load(Ordering::SeqCst), 0);

    // And a public catalog read needs no credentials at all
    let products: Value = gateway.get_public("/product").await.expect("products");
    assert_eq!(products["products"].as_array().expect("array").len(), 2);
}
