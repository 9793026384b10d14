//! Application state shared across handlers.

use std::sync::Arc;

use crate::backend::{
    BackendError, DocumentStore, FirestoreClient, IdentityProvider, IdentityToolkitClient,
    MemoryDocumentStore, MemoryIdentityProvider,
};
use crate::config::{BackendConfig, StorefrontConfig};
use crate::db::{OrderRepository, ProductRepository, ProfileRepository};
use crate::services::catalog::CatalogSessions;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// backend ports, the product cache and the per-visitor catalog sessions.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    products: ProductRepository,
    catalog_sessions: CatalogSessions,
}

impl AppState {
    /// Create a new application state over the given backend.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        let products = ProductRepository::new(Arc::clone(&store));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                identity,
                products,
                catalog_sessions: CatalogSessions::new(),
            }),
        }
    }

    /// Build the backend selected by `config` and wrap it in a new state.
    ///
    /// # Errors
    ///
    /// Returns an error if the memory backend's seed file cannot be loaded.
    pub async fn from_config(config: StorefrontConfig) -> Result<Self, BackendError> {
        let (store, identity): (Arc<dyn DocumentStore>, Arc<dyn IdentityProvider>) =
            match &config.backend {
                BackendConfig::Firebase(firebase) => {
                    tracing::info!(project = %firebase.project_id, "Using Firebase backend");
                    (
                        Arc::new(FirestoreClient::new(firebase)),
                        Arc::new(IdentityToolkitClient::new(firebase)),
                    )
                }
                BackendConfig::Memory { seed_file } => {
                    let store = match seed_file {
                        Some(path) => MemoryDocumentStore::from_seed_file(path).await?,
                        None => MemoryDocumentStore::new(),
                    };
                    tracing::warn!("Using in-memory backend; data is lost on restart");
                    (Arc::new(store), Arc::new(MemoryIdentityProvider::new()))
                }
            };

        Ok(Self::new(config, store, identity))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the document database.
    #[must_use]
    pub fn store(&self) -> &dyn DocumentStore {
        self.inner.store.as_ref()
    }

    /// Get the identity provider.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Get the cached product repository.
    #[must_use]
    pub fn products(&self) -> &ProductRepository {
        &self.inner.products
    }

    /// Get the per-visitor catalog session registry.
    #[must_use]
    pub fn catalog_sessions(&self) -> &CatalogSessions {
        &self.inner.catalog_sessions
    }

    /// Order repository over the document database.
    #[must_use]
    pub fn orders(&self) -> OrderRepository<'_> {
        OrderRepository::new(self.store())
    }

    /// Profile repository over the document database.
    #[must_use]
    pub fn profiles(&self) -> ProfileRepository<'_> {
        ProfileRepository::new(self.store())
    }
}
