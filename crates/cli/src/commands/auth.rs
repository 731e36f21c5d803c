//! Session commands: login, register, logout, whoami.
//!
//! # Usage
//!
//! ```bash
//! khaja auth login -e user@example.com -p hunter2
//! khaja auth register -n "Bigyan" -e user@example.com --phone 9841234567
//! khaja auth whoami
//! khaja auth logout
//! ```
//!
//! The password can also be supplied via `KHAJA_PASSWORD` to keep it out of
//! shell history.

use khaja_client::auth::Registration;
use tracing::info;

use super::{Context, resolve_password};

/// Sign in and persist the issued credentials.
pub async fn login(email: &str, password: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let password = resolve_password(password)?;
    let ctx = Context::load().await?;

    let claims = ctx.auth.login(email, &password).await?;
    info!(
        "Signed in as {} ({})",
        claims.name.as_deref().unwrap_or("unknown"),
        claims.id
    );
    Ok(())
}

/// Create an account and persist the issued credentials.
pub async fn register(
    name: &str,
    email: &str,
    phone: &str,
    password: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = resolve_password(password)?;
    let ctx = Context::load().await?;

    let claims = ctx
        .auth
        .register(&Registration {
            name: name.to_owned(),
            email: email.to_owned(),
            phone: phone.to_owned(),
            password,
        })
        .await?;
    info!("Account created: {}", claims.id);
    Ok(())
}

/// Sign out and remove stored credentials.
pub async fn logout() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;
    ctx.auth.logout().await?;
    info!("Signed out");
    Ok(())
}

/// Show the current session, restoring it from disk if needed.
pub async fn whoami() -> Result<(), Box<dyn std::error::Error>> {
    let ctx = Context::load().await?;

    match ctx.gateway.session().claims().await {
        Some(claims) => {
            info!(
                "Signed in as {} <{}> ({})",
                claims.name.as_deref().unwrap_or("unknown"),
                claims.email.as_deref().unwrap_or("no email"),
                claims.id
            );
        }
        None => info!("Not signed in"),
    }
    Ok(())
}
