//! Session state: token pair, decoded claims, and the process-wide holder.
//!
//! A session exists exactly when an access token is present; identity claims
//! are derived by decoding the token's payload segment and are never
//! independently verified client-side - the backend is the authority on
//! every request. The holder moves through
//! `Unauthenticated -> Authenticated -> Unauthenticated` only; while
//! authenticated, the access token may be silently rotated any number of
//! times by the gateway's recovery protocol.

use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;

use khaja_core::UserId;

/// Errors that can occur when decoding token claims.
#[derive(Debug, Error)]
pub enum ClaimsError {
    /// The token is not a three-segment JWT.
    #[error("access token has no payload segment")]
    MissingPayload,

    /// The payload segment is not valid base64url.
    #[error("access token payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The payload JSON does not match the expected claim shape.
    #[error("access token payload is not valid claims JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Identity claims decoded from the access token payload.
///
/// Decoded without signature verification: the claims are used only for
/// display and request construction, never as an authorization decision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Backend user ID (`sub` in standard tokens, `id` in ours).
    #[serde(alias = "sub")]
    pub id: UserId,
    /// Display name, if the backend includes it.
    #[serde(default)]
    pub name: Option<String>,
    /// Email address, if the backend includes it.
    #[serde(default)]
    pub email: Option<String>,
    /// Expiry (seconds since epoch), if present.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl Claims {
    /// Decode claims from a JWT access token.
    ///
    /// Splits out the payload segment, base64url-decodes it, and parses the
    /// claim JSON. The signature segment is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the token has no payload segment or the payload
    /// is not valid base64url / claims JSON.
    pub fn decode(access_token: &str) -> Result<Self, ClaimsError> {
        let payload = access_token
            .split('.')
            .nth(1)
            .ok_or(ClaimsError::MissingPayload)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload)?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// An authenticated session: token pair plus cached decoded claims.
///
/// Implements `Debug` manually to redact both tokens.
#[derive(Clone)]
pub struct Session {
    access_token: SecretString,
    refresh_token: SecretString,
    claims: Claims,
    /// When the current access token was obtained (seconds since epoch).
    obtained_at: i64,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("claims", &self.claims)
            .field("obtained_at", &self.obtained_at)
            .finish()
    }
}

impl Session {
    /// Build a session from a token pair, decoding identity claims from the
    /// access token.
    ///
    /// # Errors
    ///
    /// Returns an error if claims cannot be derived from the access token -
    /// a session without derivable claims would violate the session
    /// invariant, so it is never constructed.
    pub fn new(access_token: SecretString, refresh_token: SecretString) -> Result<Self, ClaimsError> {
        let claims = Claims::decode(access_token.expose_secret())?;
        Ok(Self {
            access_token,
            refresh_token,
            claims,
            obtained_at: chrono::Utc::now().timestamp(),
        })
    }

    /// The bearer credential for outgoing requests.
    #[must_use]
    pub const fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// The long-lived refresh credential.
    #[must_use]
    pub const fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    /// Decoded identity claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }

    /// When the current access token was obtained (seconds since epoch).
    #[must_use]
    pub const fn obtained_at(&self) -> i64 {
        self.obtained_at
    }
}

/// Process-wide session holder.
///
/// Cheap to clone; all clones observe the same session. Only the gateway's
/// recovery protocol and the explicit login/register/logout operations write
/// it - no other component mutates session state directly.
#[derive(Clone, Default)]
pub struct SessionHandle {
    inner: Arc<RwLock<Option<Session>>>,
}

impl SessionHandle {
    /// Create an unauthenticated holder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a session (login/register success, or a recovery rotation).
    pub async fn set(&self, session: Session) {
        *self.inner.write().await = Some(session);
    }

    /// Tear down to the unauthenticated state.
    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }

    /// Current access token, if authenticated.
    pub async fn access_token(&self) -> Option<SecretString> {
        self.inner
            .read()
            .await
            .as_ref()
            .map(|s| s.access_token.clone())
    }

    /// Current decoded claims, if authenticated.
    pub async fn claims(&self) -> Option<Claims> {
        self.inner.read().await.as_ref().map(|s| s.claims.clone())
    }

    /// Whether a session is currently held.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.read().await.is_some()
    }
}

/// Build an unsigned JWT with the given payload JSON. Test helper shared
/// across the crate.
#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) fn fake_token(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(payload).unwrap());
    format!("{header}.{body}.sig")
}
