//! Cart persistence in the visitor's session.
//!
//! The whole cart is read and written under one session key on every
//! mutation. Concurrent requests from the same visitor race; the last write
//! wins.

use tower_sessions::Session;

use crate::models::{Cart, session_keys};

/// Read the cart; a missing or unreadable entry is an empty cart.
pub async fn load(session: &Session) -> Cart {
    match session.get::<Cart>(session_keys::CART).await {
        Ok(cart) => cart.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable cart");
            Cart::new()
        }
    }
}

/// Write the cart.
///
/// # Errors
///
/// Returns the session store error if the write fails.
pub async fn save(session: &Session, cart: &Cart) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Load, mutate and save the cart in one step.
///
/// The cart is saved even when `mutate` reports an error, which is harmless
/// because rejected mutations leave the cart unchanged.
///
/// # Errors
///
/// Returns the session store error if the write fails.
pub async fn update<T>(
    session: &Session,
    mutate: impl FnOnce(&mut Cart) -> T + Send,
) -> Result<(Cart, T), tower_sessions::session::Error> {
    let mut cart = load(session).await;
    let result = mutate(&mut cart);
    save(session, &cart).await?;
    Ok((cart, result))
}
