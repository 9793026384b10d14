//! Typed repositories over the document database.
//!
//! # Collections
//!
//! - `produtos` - Catalog (read-only from the storefront, cached 5 minutes)
//! - `pedidos` - Orders written at checkout
//! - `users` - Profiles keyed by user id, holding the `favorites` array
//!
//! The database is the source of truth; nothing here keeps a local copy
//! beyond the product cache.

mod orders;
mod products;
mod profiles;

pub use orders::OrderRepository;
pub use products::{CatalogQuery, PAGE_SIZE, ProductPage, ProductRepository, SortMode};
pub use profiles::ProfileRepository;

use thiserror::Error;

use crate::backend::BackendError;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The document database failed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Requested document was not found.
    #[error("not found")]
    NotFound,
}

impl RepositoryError {
    /// Fold the backend's own not-found into [`RepositoryError::NotFound`].
    fn from_write(err: BackendError) -> Self {
        match err {
            BackendError::NotFound(_) => Self::NotFound,
            other => Self::Backend(other),
        }
    }
}
