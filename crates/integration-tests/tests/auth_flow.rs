//! Integration tests for login, logout, cold-start rehydration, and
//! account management.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use serde_json::Value;

use khaja_client::credentials::{CredentialStore, MemoryCredentialStore};
use khaja_client::{ApiConfig, AuthClient, ApiGateway, SessionHandle};
use khaja_integration_tests::MockBackend;

fn config(base_url: &str) -> ApiConfig {
    ApiConfig::new(
        base_url.parse().expect("mock backend URL"),
        std::env::temp_dir().join("khaja-auth-int"),
    )
}

fn stack_with_store(
    backend: &MockBackend,
    store: Arc<MemoryCredentialStore>,
) -> (AuthClient, ApiGateway, SessionHandle) {
    let session = SessionHandle::new();
    let gateway = ApiGateway::new(
        &config(backend.base_url()),
        session.clone(),
        store as Arc<dyn CredentialStore>,
    )
    .expect("gateway");
    (AuthClient::new(gateway.clone()), gateway, session)
}

#[tokio::test]
async fn test_login_establishes_session_and_persists_tokens() {
    let backend = MockBackend::spawn().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let (auth, gateway, session) = stack_with_store(&backend, Arc::clone(&store));

    let claims = auth
        .login("bigyan@example.com", "hunter2!")
        .await
        .expect("login");
    assert_eq!(claims.id.as_str(), "u-1");
    assert!(session.is_authenticated().await);
    assert!(store.get().await.expect("store").is_some());

    // The issued token works immediately, no refresh needed
    let orders: Value = gateway.get("/orders/user/u-1").await.expect("orders");
    assert!(orders["orders"].as_array().expect("array").is_empty());
    assert_eq!(backend.state.refresh_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_cold_start_rehydrates_from_durable_store() {
    let backend = MockBackend::spawn().await;
    let store = Arc::new(MemoryCredentialStore::new());

    // First process: sign in, credentials land in the durable store
    {
        let (auth, _, _) = stack_with_store(&backend, Arc::clone(&store));
        auth.login("bigyan@example.com", "hunter2!")
            .await
            .expect("login");
    }

    // Second process: fresh session holder, same store
    let (auth, gateway, session) = stack_with_store(&backend, Arc::clone(&store));
    assert!(!session.is_authenticated().await);

    let claims = auth.restore().await.expect("restore").expect("claims");
    assert_eq!(claims.id.as_str(), "u-1");
    assert!(session.is_authenticated().await);

    let result: Result<Value, _> = gateway.get("/orders/user/u-1").await;
    assert!(result.is_ok());
    assert_eq!(backend.state.refresh_hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_logout_purges_credentials_and_session() {
    let backend = MockBackend::spawn().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let (auth, _, session) = stack_with_store(&backend, Arc::clone(&store));

    auth.login("bigyan@example.com", "hunter2!")
        .await
        .expect("login");
    auth.logout().await.expect("logout");

    assert!(!session.is_authenticated().await);
    assert!(store.get().await.expect("store").is_none());
}

#[tokio::test]
async fn test_profile_edit_reaches_backend_authenticated() {
    let backend = MockBackend::spawn().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let (auth, _, _) = stack_with_store(&backend, Arc::clone(&store));

    auth.login("bigyan@example.com", "hunter2!")
        .await
        .expect("login");
    auth.update_profile("Bigyan T", "bigyan.t@example.com")
        .await
        .expect("profile edit");

    let recorded = backend
        .state
        .last_profile_edit
        .lock()
        .expect("lock")
        .clone()
        .expect("edit body");
    assert_eq!(recorded["name"], "Bigyan T");
    assert_eq!(recorded["email"], "bigyan.t@example.com");
}

#[tokio::test]
async fn test_password_change_sends_both_passwords() {
    let backend = MockBackend::spawn().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let (auth, _, _) = stack_with_store(&backend, Arc::clone(&store));

    auth.login("bigyan@example.com", "hunter2!")
        .await
        .expect("login");
    auth.change_password("hunter2!", "hunter3!")
        .await
        .expect("password change");

    let recorded = backend
        .state
        .last_password_change
        .lock()
        .expect("lock")
        .clone()
        .expect("change body");
    assert_eq!(recorded["oldPassword"], "hunter2!");
    assert_eq!(recorded["newPassword"], "hunter3!");
}

#[tokio::test]
async fn test_account_deletion_tears_down_local_state() {
    let backend = MockBackend::spawn().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let (auth, _, session) = stack_with_store(&backend, Arc::clone(&store));

    auth.login("bigyan@example.com", "hunter2!")
        .await
        .expect("login");
    auth.delete_account("hunter2!").await.expect("delete account");

    assert!(backend.state.account_deleted.load(Ordering::SeqCst));
    assert!(!session.is_authenticated().await);
    assert!(store.get().await.expect("store").is_none());
}

#[tokio::test]
async fn test_login_rejection_leaves_no_session() {
    let backend = MockBackend::spawn().await;
    let store = Arc::new(MemoryCredentialStore::new());
    let (auth, _, session) = stack_with_store(&backend, Arc::clone(&store));

    // The mock rejects bodies without both fields; a malformed email is
    // rejected client-side before the request is even built
    let err = auth.login("not-an-email", "pw").await.unwrap_err();
    assert!(matches!(
        err,
        khaja_client::auth::AuthError::InvalidEmail(_)
    ));
    assert!(!session.is_authenticated().await);
    assert!(store.get().await.expect("store").is_none());
}
