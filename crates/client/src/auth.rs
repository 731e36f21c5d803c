//! Authentication and account management.
//!
//! Login and registration are the only operations that establish a session;
//! everything here keeps the session holder and the durable credential store
//! in lockstep. Input is validated client-side before any network traffic,
//! but the backend stays authoritative on every request.

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use khaja_core::{Email, EmailError, Phone, PhoneError};

use crate::credentials::TokenPair;
use crate::error::ApiError;
use crate::gateway::ApiGateway;
use crate::session::{Claims, ClaimsError, Session};
use crate::storage::StoreError;

/// Errors that can occur during authentication and account management.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email address failed client-side validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The phone number failed client-side validation.
    #[error("invalid phone number: {0}")]
    InvalidPhone(#[from] PhoneError),

    /// The backend issued a token the client cannot decode.
    #[error("malformed access token: {0}")]
    Token(#[from] ClaimsError),

    /// The credential store failed.
    #[error("credential store: {0}")]
    Store(#[from] StoreError),

    /// The request itself failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Registration form input.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

/// Token pair issued by login, registration, and refresh.
#[derive(Deserialize)]
struct TokensResponse {
    #[serde(rename = "accessToken")]
    access_token: String,
    #[serde(rename = "refreshToken")]
    refresh_token: String,
}

/// Authentication surface over the gateway.
#[derive(Clone)]
pub struct AuthClient {
    gateway: ApiGateway,
}

impl AuthClient {
    /// Create an auth client over the given gateway.
    #[must_use]
    pub const fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    /// Sign in with email and password, establishing a session.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is malformed, the backend rejects the
    /// credentials, or the issued tokens cannot be persisted or decoded.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Claims, AuthError> {
        let email = Email::parse(email)?;

        let tokens: TokensResponse = self
            .gateway
            .post_public(
                "/auth/login",
                &serde_json::json!({
                    "email": email.as_str(),
                    "password": password,
                }),
            )
            .await?;

        let claims = self.install_session(tokens).await?;
        info!(user = %claims.id, "signed in");
        Ok(claims)
    }

    /// Create an account, establishing a session on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the email or phone is malformed, the backend
    /// rejects the registration, or the issued tokens cannot be persisted or
    /// decoded.
    #[instrument(skip(self, form), fields(email = %form.email))]
    pub async fn register(&self, form: &Registration) -> Result<Claims, AuthError> {
        let email = Email::parse(&form.email)?;
        let phone = Phone::parse(&form.phone)?;

        let tokens: TokensResponse = self
            .gateway
            .post_public(
                "/auth/register",
                &serde_json::json!({
                    "name": form.name,
                    "email": email.as_str(),
                    "phone": phone.as_str(),
                    "password": form.password,
                }),
            )
            .await?;

        let claims = self.install_session(tokens).await?;
        info!(user = %claims.id, "account created");
        Ok(claims)
    }

    /// Sign out: notify the backend on a best-effort basis, then tear down
    /// local state unconditionally.
    ///
    /// # Errors
    ///
    /// Returns an error only if the local credential record cannot be
    /// removed. A failed backend notification is logged and ignored.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        // The backend call may fail (expired session, offline); local
        // teardown must happen regardless.
        if let Err(e) = self.gateway.get::<serde_json::Value>("/auth/logout").await {
            debug!(error = %e, "logout notification failed");
        }

        self.gateway.credentials().delete().await?;
        self.gateway.session().clear().await;
        info!("signed out");
        Ok(())
    }

    /// Rehydrate the session from the durable credential store at cold
    /// start. Returns the restored claims, or `None` when no usable
    /// credentials exist.
    ///
    /// A persisted record whose access token no longer decodes is purged
    /// rather than surfaced, the next screen simply starts unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential store cannot be read or a stale
    /// record cannot be purged.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<Claims>, AuthError> {
        let Some(tokens) = self.gateway.credentials().get().await? else {
            return Ok(None);
        };

        match Session::new(tokens.access_token, tokens.refresh_token) {
            Ok(session) => {
                let claims = session.claims().clone();
                self.gateway.session().set(session).await;
                debug!(user = %claims.id, "session restored from durable store");
                Ok(Some(claims))
            }
            Err(e) => {
                warn!(error = %e, "persisted access token is malformed, purging");
                self.gateway.credentials().delete().await?;
                Ok(None)
            }
        }
    }

    /// Update the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the email is malformed, the request fails, or the
    /// session cannot be recovered after a 401.
    #[instrument(skip(self))]
    pub async fn update_profile(&self, name: &str, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;

        let _: serde_json::Value = self
            .gateway
            .put(
                "/auth/user/edit",
                &serde_json::json!({
                    "name": name,
                    "email": email.as_str(),
                }),
            )
            .await?;
        Ok(())
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the session cannot be
    /// recovered after a 401.
    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let _: serde_json::Value = self
            .gateway
            .put(
                "/auth/user/password/edit",
                &serde_json::json!({
                    "oldPassword": old_password,
                    "newPassword": new_password,
                }),
            )
            .await?;
        Ok(())
    }

    /// Permanently delete the signed-in user's account, tearing down local
    /// state on success.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the session cannot be
    /// recovered after a 401, or local teardown fails.
    #[instrument(skip(self, password))]
    pub async fn delete_account(&self, password: &str) -> Result<(), AuthError> {
        let _: serde_json::Value = self
            .gateway
            .post(
                "/auth/user/delete",
                &serde_json::json!({ "password": password }),
            )
            .await?;

        self.gateway.credentials().delete().await?;
        self.gateway.session().clear().await;
        info!("account deleted");
        Ok(())
    }

    /// Persist an issued token pair and install the session it describes.
    async fn install_session(&self, tokens: TokensResponse) -> Result<Claims, AuthError> {
        let pair = TokenPair {
            access_token: SecretString::from(tokens.access_token),
            refresh_token: SecretString::from(tokens.refresh_token),
        };
        self.gateway.credentials().save(&pair).await?;

        let session = Session::new(pair.access_token, pair.refresh_token)?;
        let claims = session.claims().clone();
        self.gateway.session().set(session).await;
        Ok(claims)
    }
}
