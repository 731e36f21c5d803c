//! Integration tests for the Khaja client.
//!
//! Every test runs against an in-process mock of the Khaja backend: an axum
//! router bound to an ephemeral local port, with instrumented token state so
//! tests can force 401s, break the refresh endpoint, and count how often
//! each route was hit.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p khaja-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `gateway_recovery` - 401 recovery protocol (refresh, retry, teardown)
//! - `auth_flow` - Login, logout, rehydration, and account management
//! - `checkout_flow` - Cart totals, order submission, fail-closed validation
//! - `catalog_flow` - Cached catalog reads, search, and favourites

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde_json::{Value, json};

/// Refresh token the mock backend accepts.
pub const REFRESH_TOKEN: &str = "refresh-token-1";

/// Build an unsigned JWT carrying the given identity claims.
#[must_use]
pub fn fake_jwt(user_id: &str, name: &str, rotation: u32) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::to_vec(&json!({
            "id": user_id,
            "name": name,
            "email": format!("{name}@example.com"),
            "rot": rotation,
        }))
        .expect("claims serialize"),
    );
    format!("{header}.{payload}.sig")
}

/// Instrumented backend state shared with the test body.
pub struct BackendState {
    /// The only access token protected routes currently accept.
    pub valid_access: RwLock<String>,
    /// Whether the refresh endpoint honours the refresh token.
    pub refresh_ok: AtomicBool,
    /// Monotonic rotation counter so every refresh issues a distinct token.
    rotation: AtomicU32,
    pub refresh_hits: AtomicU32,
    pub protected_hits: AtomicU32,
    pub order_hits: AtomicU32,
    pub product_hits: AtomicU32,
    pub account_deleted: AtomicBool,
    /// Last order payload received by the order-creation route.
    pub last_order: Mutex<Option<Value>>,
    /// Last body received by the profile-edit route.
    pub last_profile_edit: Mutex<Option<Value>>,
    /// Last body received by the password-change route.
    pub last_password_change: Mutex<Option<Value>>,
    /// Last body received by the favourites-add route.
    pub last_favourite: Mutex<Option<Value>>,
}

impl BackendState {
    fn new() -> Self {
        Self {
            valid_access: RwLock::new(fake_jwt("u-1", "bigyan", 0)),
            refresh_ok: AtomicBool::new(true),
            rotation: AtomicU32::new(0),
            refresh_hits: AtomicU32::new(0),
            protected_hits: AtomicU32::new(0),
            order_hits: AtomicU32::new(0),
            product_hits: AtomicU32::new(0),
            account_deleted: AtomicBool::new(false),
            last_order: Mutex::new(None),
            last_profile_edit: Mutex::new(None),
            last_password_change: Mutex::new(None),
            last_favourite: Mutex::new(None),
        }
    }

    /// The token protected routes currently accept.
    #[must_use]
    pub fn current_access(&self) -> String {
        self.valid_access.read().expect("lock").clone()
    }

    /// Invalidate the current access token without telling the client,
    /// simulating server-side expiry.
    pub fn expire_access(&self) {
        let rotation = self.rotation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.valid_access.write().expect("lock") = fake_jwt("u-1", "bigyan", rotation);
    }

    /// Break the refresh endpoint so recovery fails.
    pub fn break_refresh(&self) {
        self.refresh_ok.store(false, Ordering::SeqCst);
    }

    fn rotate(&self) -> String {
        let rotation = self.rotation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = fake_jwt("u-1", "bigyan", rotation);
        *self.valid_access.write().expect("lock") = token.clone();
        token
    }

    fn bearer_ok(&self, headers: &HeaderMap) -> bool {
        let expected = format!("Bearer {}", self.current_access());
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

/// An in-process mock of the Khaja backend.
pub struct MockBackend {
    base_url: String,
    pub state: Arc<BackendState>,
}

impl MockBackend {
    /// Bind the mock router to an ephemeral local port and serve it in the
    /// background for the lifetime of the test process.
    pub async fn spawn() -> Self {
        let state = Arc::new(BackendState::new());

        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/logout", get(logout))
            .route("/api/refresh/mobile", post(refresh))
            .route("/api/auth/user/edit", put(edit_profile))
            .route("/api/auth/user/password/edit", put(change_password))
            .route("/api/auth/user/delete", post(delete_account))
            .route("/api/product", get(products))
            .route("/api/restaurant", get(restaurants))
            .route("/api/restaurant/{name}", get(restaurant_menu))
            .route("/api/category", get(categories))
            .route("/api/carousel", get(carousel))
            .route("/api/search", get(search))
            .route("/api/favourites", get(favourites))
            .route("/api/favourites/full", get(favourites_full))
            .route("/api/favourites/add", post(add_favourite))
            .route("/api/orders/user/{id}", get(user_orders))
            .route("/api/orders/create", post(create_order))
            .route("/api/always-401", get(always_unauthorized))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve mock backend");
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    /// Backend origin for [`khaja_client::ApiConfig`].
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

async fn login(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if body["email"].as_str().is_none() || body["password"].as_str().is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "email and password required" })),
        );
    }

    let access = state.rotate();
    (
        StatusCode::OK,
        Json(json!({
            "accessToken": access,
            "refreshToken": REFRESH_TOKEN,
        })),
    )
}

async fn logout(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> StatusCode {
    if state.bearer_ok(&headers) {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    }
}

async fn refresh(
    State(state): State<Arc<BackendState>>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.refresh_hits.fetch_add(1, Ordering::SeqCst);

    let presented = body["refreshToken"].as_str().unwrap_or_default();
    if presented != REFRESH_TOKEN || !state.refresh_ok.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "invalid refresh token" })),
        );
    }

    let access = state.rotate();
    (StatusCode::OK, Json(json!({ "accessToken": access })))
}

fn product_docs() -> Vec<Value> {
    vec![
        json!({ "_id": "p-momo", "name": "Chicken Momo", "price": "180.00",
                "photos": ["https://cdn.example.com/momo.jpg"], "category": "Momo" }),
        json!({ "_id": "p-chowmein", "name": "Veg Chowmein", "price": "150.00",
                "photos": [], "category": "Noodles" }),
    ]
}

async fn products(
    State(state): State<Arc<BackendState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    state.product_hits.fetch_add(1, Ordering::SeqCst);

    let docs: Vec<Value> = match params.get("category") {
        Some(category) => product_docs()
            .into_iter()
            .filter(|doc| doc["category"].as_str() == Some(category))
            .collect(),
        None => product_docs(),
    };
    Json(json!({ "products": docs }))
}

async fn restaurants() -> Json<Value> {
    Json(json!({
        "restaurants": [
            { "_id": "r-1", "name": "Himalayan Kitchen", "address": "Thamel" },
        ],
    }))
}

async fn restaurant_menu(Path(name): Path<String>) -> (StatusCode, Json<Value>) {
    if name != "Himalayan Kitchen" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "restaurant not found" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "restaurant": { "_id": "r-1", "name": "Himalayan Kitchen", "address": "Thamel" },
            "products": product_docs(),
        })),
    )
}

async fn categories() -> Json<Value> {
    Json(json!({
        "categories": [
            { "_id": "c-1", "name": "Momo" },
            { "_id": "c-2", "name": "Noodles" },
        ],
    }))
}

async fn carousel() -> Json<Value> {
    Json(json!({
        "carouselList": [
            { "_id": "sl-1", "image": "https://cdn.example.com/slide-1.jpg",
              "title": "Momo week" },
        ],
    }))
}

async fn search(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    let query = params.get("query").map(String::as_str).unwrap_or_default();
    let kind = params.get("type").map(String::as_str).unwrap_or("product");

    let products: Vec<Value> = if kind == "product" {
        product_docs()
            .into_iter()
            .filter(|doc| {
                doc["name"]
                    .as_str()
                    .is_some_and(|n| n.to_lowercase().contains(&query.to_lowercase()))
            })
            .collect()
    } else {
        Vec::new()
    };
    Json(json!({ "products": products, "restaurants": [] }))
}

async fn favourites(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !state.bearer_ok(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "jwt expired" })),
        );
    }
    let user_id = params.get("userId").map(String::as_str).unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "favourites": [
                { "_id": "f-1", "userId": user_id, "itemId": "p-momo", "type": "product" },
            ],
        })),
    )
}

async fn favourites_full(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !state.bearer_ok(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "jwt expired" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "products": [product_docs().remove(0)], "restaurants": [] })),
    )
}

async fn add_favourite(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !state.bearer_ok(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "jwt expired" })),
        );
    }
    *state.last_favourite.lock().expect("lock") = Some(body);
    (StatusCode::OK, Json(json!({ "message": "saved" })))
}

async fn edit_profile(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !state.bearer_ok(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "jwt expired" })),
        );
    }
    *state.last_profile_edit.lock().expect("lock") = Some(body);
    (StatusCode::OK, Json(json!({ "message": "updated" })))
}

async fn change_password(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    if !state.bearer_ok(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "jwt expired" })),
        );
    }
    if body["oldPassword"].as_str().is_none() || body["newPassword"].as_str().is_none() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "message": "both passwords required" })),
        );
    }
    *state.last_password_change.lock().expect("lock") = Some(body);
    (StatusCode::OK, Json(json!({ "message": "password changed" })))
}

async fn delete_account(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    if !state.bearer_ok(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "jwt expired" })),
        );
    }
    state.account_deleted.store(true, Ordering::SeqCst);
    (StatusCode::OK, Json(json!({ "message": "account deleted" })))
}

async fn user_orders(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
    state.protected_hits.fetch_add(1, Ordering::SeqCst);

    if !state.bearer_ok(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "jwt expired" })),
        );
    }
    (StatusCode::OK, Json(json!({ "orders": [] })))
}

/// Rejects every bearer, even a freshly rotated one. Lets tests observe
/// that a 401 on the retried request propagates instead of looping.
async fn always_unauthorized(State(state): State<Arc<BackendState>>) -> (StatusCode, Json<Value>) {
    state.protected_hits.fetch_add(1, Ordering::SeqCst);
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "jwt expired" })),
    )
}

async fn create_order(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    state.order_hits.fetch_add(1, Ordering::SeqCst);

    if !state.bearer_ok(&headers) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "jwt expired" })),
        );
    }

    *state.last_order.lock().expect("lock") = Some(body);
    (StatusCode::OK, Json(json!({ "orderId": "ord-1001" })))
}
