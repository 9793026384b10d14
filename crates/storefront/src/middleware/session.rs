//! Session middleware configuration.
//!
//! Sessions hold the signed-in user, the cart and the catalog-session token.
//! They are kept in process memory; a restart signs everyone out and empties
//! carts.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use uuid::Uuid;

use crate::config::StorefrontConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "fe_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// The visitor's catalog-session token, created on first use.
///
/// # Errors
///
/// Returns an error if a new token cannot be stored in the session.
pub async fn catalog_token(session: &Session) -> Result<String, tower_sessions::session::Error> {
    if let Some(token) = session.get::<String>(session_keys::CATALOG_TOKEN).await? {
        return Ok(token);
    }
    let token = Uuid::new_v4().to_string();
    session.insert(session_keys::CATALOG_TOKEN, &token).await?;
    Ok(token)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[tokio::test]
    async fn test_catalog_token_is_stable() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let first = catalog_token(&session).await.unwrap();
        let second = catalog_token(&session).await.unwrap();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());
    }
}
