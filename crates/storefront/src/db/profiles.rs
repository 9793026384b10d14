//! Profile repository.

use serde_json::Value;
use tracing::instrument;

use fantasia_core::{ProductId, UserId};

use super::RepositoryError;
use crate::backend::DocumentStore;
use crate::models::Profile;
use crate::models::profile::{COLLECTION, FAVORITES_FIELD};

/// Repository for user profile documents.
pub struct ProfileRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ProfileRepository<'a> {
    /// Create a new profile repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get a user's profile, if it exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn get(&self, user_id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        match self.store.get(COLLECTION, user_id.as_str()).await? {
            Some(document) => Ok(Some(Profile::from_document(&document)?)),
            None => Ok(None),
        }
    }

    /// The user's favorites; empty when the profile does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails.
    pub async fn favorites(&self, user_id: &UserId) -> Result<Vec<ProductId>, RepositoryError> {
        Ok(self
            .get(user_id)
            .await?
            .map(|p| p.favorites)
            .unwrap_or_default())
    }

    /// Create (or overwrite) a profile with the given favorites.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    #[instrument(skip(self, favorites), fields(user_id = %user_id))]
    pub async fn create(
        &self,
        user_id: &UserId,
        favorites: Vec<ProductId>,
    ) -> Result<(), RepositoryError> {
        let profile = Profile { favorites };
        self.store
            .set(COLLECTION, user_id.as_str(), profile.to_fields())
            .await?;
        Ok(())
    }

    /// Add a product to an existing profile's favorites (no duplicates).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn add_favorite(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<(), RepositoryError> {
        self.store
            .array_union(
                COLLECTION,
                user_id.as_str(),
                FAVORITES_FIELD,
                Value::String(product_id.as_str().to_string()),
            )
            .await
            .map_err(RepositoryError::from_write)
    }

    /// Remove a product from an existing profile's favorites.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the profile does not exist.
    #[instrument(skip(self), fields(user_id = %user_id, product_id = %product_id))]
    pub async fn remove_favorite(
        &self,
        user_id: &UserId,
        product_id: &ProductId,
    ) -> Result<(), RepositoryError> {
        self.store
            .array_remove(
                COLLECTION,
                user_id.as_str(),
                FAVORITES_FIELD,
                Value::String(product_id.as_str().to_string()),
            )
            .await
            .map_err(RepositoryError::from_write)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::backend::MemoryDocumentStore;

    #[tokio::test]
    async fn test_add_requires_existing_profile() {
        let store = MemoryDocumentStore::new();
        let repo = ProfileRepository::new(&store);
        let user = UserId::new("u1");
        let product = ProductId::new("p1");

        let err = repo.add_favorite(&user, &product).await.unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound));

        repo.create(&user, vec![product.clone()]).await.unwrap();
        repo.add_favorite(&user, &ProductId::new("p2")).await.unwrap();
        repo.add_favorite(&user, &product).await.unwrap();
        assert_eq!(
            repo.favorites(&user).await.unwrap(),
            [product.clone(), ProductId::new("p2")]
        );

        repo.remove_favorite(&user, &product).await.unwrap();
        assert_eq!(repo.favorites(&user).await.unwrap(), [ProductId::new("p2")]);
    }

    #[tokio::test]
    async fn test_favorites_of_unknown_user_is_empty() {
        let store = MemoryDocumentStore::new();
        let favorites = ProfileRepository::new(&store)
            .favorites(&UserId::new("ghost"))
            .await
            .unwrap();
        assert!(favorites.is_empty());
    }
}
