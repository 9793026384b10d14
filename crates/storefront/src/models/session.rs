//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use fantasia_core::{Email, UserId};

use crate::backend::AuthUser;

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    /// Identity provider user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
}

impl From<AuthUser> for CurrentUser {
    fn from(user: AuthUser) -> Self {
        Self {
            id: user.uid,
            email: user.email,
        }
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current signed-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the serialized cart.
    pub const CART: &str = "cart";

    /// Key for the visitor's catalog-session token.
    pub const CATALOG_TOKEN: &str = "catalog_token";
}
