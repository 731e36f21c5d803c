//! Authenticated API gateway.
//!
//! Wraps outbound HTTP calls against the configured backend origin: attaches
//! the bearer credential during pre-flight, classifies failures on response,
//! and transparently recovers from a single class of failure - an expired
//! access token, observed as a 401 - by refreshing and retrying the original
//! request exactly once.
//!
//! # Recovery protocol
//!
//! Triggered at most once per original request:
//!
//! 1. Read the refresh token from the credential store (absence is terminal)
//! 2. Call the refresh endpoint, itself flagged to skip the auth interceptor
//!    so a failing refresh can never recurse
//! 3. On success, persist the rotated access token alongside the unchanged
//!    refresh token, update the session holder's token and claims, and
//!    re-dispatch the original request with the fresh credential
//! 4. On any failure, purge persisted credentials, clear the session holder,
//!    and surface [`ApiError::SessionExpired`] - the UI layer is expected to
//!    route the user back to authentication
//!
//! Concurrent requests each observe at most one retry; simultaneous 401s are
//! not de-duplicated and may refresh redundantly.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::credentials::{CredentialStore, TokenPair};
use crate::error::ApiError;
use crate::session::{ClaimsError, Session, SessionHandle};
use crate::storage::StoreError;

/// Path of the dedicated token-refresh endpoint.
const REFRESH_PATH: &str = "/refresh/mobile";

/// How much of an error body to keep for diagnostics.
const BODY_SNIPPET_LEN: usize = 500;

// =============================================================================
// ApiGateway
// =============================================================================

/// Gateway for all backend requests.
///
/// Cheap to clone; all clones share one HTTP connection pool, session holder,
/// and credential store.
#[derive(Clone)]
pub struct ApiGateway {
    inner: Arc<GatewayInner>,
}

struct GatewayInner {
    http: reqwest::Client,
    base_url: String,
    session: SessionHandle,
    credentials: Arc<dyn CredentialStore>,
}

/// A rebuildable description of one outgoing request.
///
/// The one retry the recovery protocol performs rebuilds the request from
/// this description instead of cloning a possibly-consumed HTTP body.
pub(crate) struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    /// Bypass the auth interceptor entirely: no bearer attachment, no
    /// recovery on 401. Used by the refresh call itself and by public
    /// content endpoints.
    skip_auth: bool,
}

impl ApiRequest {
    fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_owned(),
            query: Vec::new(),
            body: None,
            skip_auth: false,
        }
    }
}

impl ApiGateway {
    /// Create a gateway for the configured backend origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(
        config: &ApiConfig,
        session: SessionHandle,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(GatewayInner {
                http,
                base_url: config.base_url.as_str().trim_end_matches('/').to_owned(),
                session,
                credentials,
            }),
        })
    }

    /// The process-wide session holder this gateway reads and repairs.
    #[must_use]
    pub fn session(&self) -> &SessionHandle {
        &self.inner.session
    }

    /// The durable credential store this gateway mirrors session state into.
    #[must_use]
    pub fn credentials(&self) -> Arc<dyn CredentialStore> {
        Arc::clone(&self.inner.credentials)
    }

    // =========================================================================
    // Request Methods
    // =========================================================================

    /// GET an authenticated endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session cannot be
    /// recovered after a 401.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(ApiRequest::new(Method::GET, path)).await
    }

    /// GET an authenticated endpoint with query parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session cannot be
    /// recovered after a 401.
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut req = ApiRequest::new(Method::GET, path);
        req.query = query
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        self.execute(req).await
    }

    /// GET a public endpoint, bypassing the auth interceptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails. A 401 from a public endpoint
    /// is propagated as-is, never recovered.
    pub async fn get_public<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let mut req = ApiRequest::new(Method::GET, path);
        req.skip_auth = true;
        self.execute(req).await
    }

    /// GET a public endpoint with query parameters, bypassing the auth
    /// interceptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn get_public_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let mut req = ApiRequest::new(Method::GET, path);
        req.query = query
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        req.skip_auth = true;
        self.execute(req).await
    }

    /// POST a JSON body to an authenticated endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized, the request fails,
    /// or the session cannot be recovered after a 401.
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut req = ApiRequest::new(Method::POST, path);
        req.body = Some(serde_json::to_value(body)?);
        self.execute(req).await
    }

    /// POST a JSON body to a public endpoint, bypassing the auth
    /// interceptor. Used for login, registration, and the refresh call.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized or the request
    /// fails.
    pub async fn post_public<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut req = ApiRequest::new(Method::POST, path);
        req.body = Some(serde_json::to_value(body)?);
        req.skip_auth = true;
        self.execute(req).await
    }

    /// PUT a JSON body to an authenticated endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized, the request fails,
    /// or the session cannot be recovered after a 401.
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let mut req = ApiRequest::new(Method::PUT, path);
        req.body = Some(serde_json::to_value(body)?);
        self.execute(req).await
    }

    // =========================================================================
    // Dispatch & Recovery
    // =========================================================================

    /// Dispatch a request with pre-flight bearer attachment, one-shot 401
    /// recovery, and response classification.
    #[instrument(skip(self, req), fields(method = %req.method, path = %req.path, skip_auth = req.skip_auth))]
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        req: ApiRequest,
    ) -> Result<T, ApiError> {
        let token = if req.skip_auth {
            None
        } else {
            self.preflight_token().await
        };

        let response = self.send(&req, token.as_ref()).await?;

        // Skip-auth responses are returned/rejected as-is; recovering here
        // would recurse when the refresh call itself fails.
        if req.skip_auth {
            return Self::decode(response).await;
        }

        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("access token rejected, entering recovery");
            let rotated = self.recover().await?;
            // The refresh (and its persistence) is fully awaited above, so
            // the retry is guaranteed to carry the fresh token. A second
            // 401 propagates unchanged - at most one retry per request.
            let retried = self.send(&req, Some(&rotated)).await?;
            return Self::decode(retried).await;
        }

        Self::decode(response).await
    }

    /// Pre-flight token read: the session holder first, falling back to the
    /// persistent credential store when the holder is unpopulated.
    async fn preflight_token(&self) -> Option<SecretString> {
        if let Some(token) = self.inner.session.access_token().await {
            return Some(token);
        }

        match self.inner.credentials.get().await {
            Ok(tokens) => tokens.map(|t| t.access_token),
            Err(e) => {
                debug!(error = %e, "credential store read failed during pre-flight");
                None
            }
        }
    }

    /// Build and send one HTTP request.
    async fn send(
        &self,
        req: &ApiRequest,
        bearer: Option<&SecretString>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = format!("{}{}", self.inner.base_url, req.path);

        let mut builder = self.inner.http.request(req.method.clone(), url);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token.expose_secret());
        }

        Ok(builder.send().await?)
    }

    /// Classify a response: 2xx bodies decode to `T`, everything else maps
    /// to [`ApiError::Server`] with a body snippet for diagnostics.
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let status = response.status();
        // Read the body as text first for better error diagnostics
        let text = response.text().await?;

        if !status.is_success() {
            debug!(status = %status, body = %snippet(&text), "backend returned error status");
            return Err(ApiError::Server {
                status,
                message: snippet(&text),
            });
        }

        // Some endpoints (e.g. logout) reply with an empty body
        let payload = if text.is_empty() { "null" } else { &text };
        serde_json::from_str(payload).map_err(|e| {
            warn!(error = %e, body = %snippet(&text), "failed to parse backend response");
            ApiError::Parse(e)
        })
    }

    /// Run the recovery protocol. On success returns the rotated access
    /// token; on any failure tears the session down and reports
    /// [`ApiError::SessionExpired`].
    #[instrument(skip(self))]
    async fn recover(&self) -> Result<SecretString, ApiError> {
        match self.try_refresh().await {
            Ok(token) => {
                debug!("access token rotated");
                Ok(token)
            }
            Err(reason) => {
                warn!(%reason, "token refresh failed, tearing down session");
                if let Err(e) = self.inner.credentials.delete().await {
                    warn!(error = %e, "failed to purge persisted credentials");
                }
                self.inner.session.clear().await;
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Steps 1-3 of the recovery protocol; any error here means teardown.
    async fn try_refresh(&self) -> Result<SecretString, RefreshFailure> {
        let tokens = self
            .inner
            .credentials
            .get()
            .await?
            .ok_or(RefreshFailure::NoRefreshToken)?;
        let refresh_token = tokens.refresh_token;

        let mut req = ApiRequest::new(Method::POST, REFRESH_PATH);
        req.body = Some(serde_json::json!({
            "refreshToken": refresh_token.expose_secret(),
        }));
        // The refresh call must never itself trigger recovery
        req.skip_auth = true;

        let response = self.send(&req, None).await?;
        let body: RefreshResponse = Self::decode(response).await?;
        let access_token = SecretString::from(body.access_token);

        // Persist the rotated access token alongside the unchanged refresh
        // token before the retry is allowed to proceed.
        self.inner
            .credentials
            .save(&TokenPair {
                access_token: access_token.clone(),
                refresh_token: refresh_token.clone(),
            })
            .await?;

        let session = Session::new(access_token.clone(), refresh_token)?;
        self.inner.session.set(session).await;

        Ok(access_token)
    }
}

/// Response shape of the refresh endpoint.
#[derive(serde::Deserialize)]
struct RefreshResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
}

/// Internal reasons the recovery protocol can fail. Never surfaced - every
/// variant collapses to [`ApiError::SessionExpired`] after teardown.
#[derive(Debug, Error)]
enum RefreshFailure {
    #[error("no refresh token in credential store")]
    NoRefreshToken,
    #[error("credential store: {0}")]
    Store(#[from] StoreError),
    #[error("refresh request: {0}")]
    Request(#[from] ApiError),
    #[error("rotated token is malformed: {0}")]
    Claims(#[from] ClaimsError),
}

fn snippet(text: &str) -> String {
    text.chars().take(BODY_SNIPPET_LEN).collect()
}
