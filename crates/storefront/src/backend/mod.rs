//! Clients for the hosted backend: document database and identity provider.
//!
//! # Architecture
//!
//! - The hosted services are the source of truth - NO local copy of products,
//!   orders or profiles; every read goes to the document database
//! - Both collaborators sit behind async traits ([`DocumentStore`],
//!   [`IdentityProvider`]) so handlers and services never see the transport
//! - Production adapters speak the published REST protocols with `reqwest`
//! - In-memory adapters mirror the same semantics for tests and local runs
//!
//! # Example
//!
//! ```rust,ignore
//! use fantasia_storefront::backend::{DocumentQuery, DocumentStore, Direction};
//!
//! let query = DocumentQuery::collection("produtos")
//!     .where_eq("categoria", "Vestidos")
//!     .order_by_field("preco", Direction::Ascending)
//!     .limit(8);
//! let page = store.query(&query).await?;
//! ```

pub mod document;
pub mod firestore;
pub mod identity;
pub mod identity_toolkit;
pub mod memory;

pub use document::{
    Cursor, Direction, Document, DocumentQuery, DocumentStore, FieldFilter, OrderBy, OrderField,
};
pub use firestore::FirestoreClient;
pub use identity::{AuthUser, IdentityError, IdentityProvider};
pub use identity_toolkit::IdentityToolkitClient;
pub use memory::{MemoryDocumentStore, MemoryIdentityProvider};

use thiserror::Error;

/// Errors that can occur when talking to the document database.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status code.
        status: u16,
        /// Error message returned by the service, truncated.
        message: String,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// A document did not have the expected shape.
    #[error("Malformed document {document}: {reason}")]
    Malformed {
        /// Document path or key.
        document: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Document not found (for operations that require it to exist).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Reading seed data failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BackendError {
    /// Build a [`BackendError::Status`] from a response body, keeping only
    /// the first 200 characters.
    #[must_use]
    pub fn status(status: u16, body: &str) -> Self {
        Self::Status {
            status,
            message: body.chars().take(200).collect(),
        }
    }
}
