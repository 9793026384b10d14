//! Per-user profile document.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use fantasia_core::ProductId;

use crate::backend::{BackendError, Document};

/// Collection holding profiles, keyed by user id.
pub const COLLECTION: &str = "users";

/// Name of the favorites array field.
pub const FAVORITES_FIELD: &str = "favorites";

/// A user's profile. Created on the first favorite toggle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Favorited products, without duplicates.
    #[serde(default)]
    pub favorites: Vec<ProductId>,
}

impl Profile {
    /// Decode a profile from its document.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Malformed` if `favorites` is not a list of
    /// strings.
    pub fn from_document(document: &Document) -> Result<Self, BackendError> {
        document.decode()
    }

    /// Document fields for the database.
    #[must_use]
    pub fn to_fields(&self) -> Map<String, Value> {
        let favorites = self
            .favorites
            .iter()
            .map(|id| Value::String(id.as_str().to_string()))
            .collect();
        Map::from_iter([(FAVORITES_FIELD.to_string(), Value::Array(favorites))])
    }

    /// Whether `product` is a favorite.
    #[must_use]
    pub fn is_favorite(&self, product: &ProductId) -> bool {
        self.favorites.contains(product)
    }
}
