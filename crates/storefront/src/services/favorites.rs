//! Favorite products of signed-in users.

use thiserror::Error;
use tracing::{debug, instrument};

use fantasia_core::{ProductId, UserId};

use crate::db::{ProductRepository, ProfileRepository, RepositoryError};
use crate::models::Product;

/// Errors from favorite operations.
#[derive(Debug, Error)]
pub enum FavoriteError {
    /// Favorites require a signed-in user.
    #[error("Faça login para favoritar produtos.")]
    Unauthenticated,

    /// Reading or writing the profile failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Flip `product` in the user's favorites and return the new membership.
///
/// The profile is created on the first toggle.
///
/// # Errors
///
/// Returns `FavoriteError::Unauthenticated` without a user, or
/// `FavoriteError::Repository` if the profile cannot be read or written.
#[instrument(skip(profiles, user), fields(product_id = %product))]
pub async fn toggle_favorite(
    profiles: &ProfileRepository<'_>,
    user: Option<&UserId>,
    product: &ProductId,
) -> Result<bool, FavoriteError> {
    let user = user.ok_or(FavoriteError::Unauthenticated)?;

    let Some(profile) = profiles.get(user).await? else {
        profiles.create(user, vec![product.clone()]).await?;
        debug!("Created profile with first favorite");
        return Ok(true);
    };

    if profile.is_favorite(product) {
        profiles.remove_favorite(user, product).await?;
        Ok(false)
    } else {
        profiles.add_favorite(user, product).await?;
        Ok(true)
    }
}

/// The user's favorite products in favorite order.
///
/// Each id is looked up individually; ids whose product no longer exists
/// are skipped.
///
/// # Errors
///
/// Returns `FavoriteError::Repository` if a read fails.
#[instrument(skip(products, profiles), fields(user_id = %user))]
pub async fn load_favorites(
    products: &ProductRepository,
    profiles: &ProfileRepository<'_>,
    user: &UserId,
) -> Result<Vec<Product>, FavoriteError> {
    let mut favorites = Vec::new();
    for id in profiles.favorites(user).await? {
        match products.get(&id).await? {
            Some(product) => favorites.push(product),
            None => debug!(product_id = %id, "Skipping missing favorite"),
        }
    }
    Ok(favorites)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::backend::{DocumentStore, MemoryDocumentStore};

    #[tokio::test]
    async fn test_toggle_requires_user() {
        let store = MemoryDocumentStore::new();
        let profiles = ProfileRepository::new(&store);
        let err = toggle_favorite(&profiles, None, &ProductId::new("p1"))
            .await
            .unwrap_err();
        assert!(matches!(err, FavoriteError::Unauthenticated));
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_favorites() {
        let store = MemoryDocumentStore::new();
        let profiles = ProfileRepository::new(&store);
        let user = UserId::new("u1");
        let keep = ProductId::new("keep");
        let product = ProductId::new("p1");

        assert!(toggle_favorite(&profiles, Some(&user), &keep).await.unwrap());
        let before = profiles.favorites(&user).await.unwrap();

        assert!(toggle_favorite(&profiles, Some(&user), &product).await.unwrap());
        assert!(!toggle_favorite(&profiles, Some(&user), &product).await.unwrap());
        assert_eq!(profiles.favorites(&user).await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_load_favorites_skips_missing_products() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let Some(fields) = json!({"nome": "Saia", "preco": 40}).as_object().cloned() else {
            unreachable!()
        };
        store.set("produtos", "p1", fields).await.unwrap();

        let profiles = ProfileRepository::new(store.as_ref());
        let user = UserId::new("u1");
        profiles
            .create(&user, vec![ProductId::new("gone"), ProductId::new("p1")])
            .await
            .unwrap();

        let products = ProductRepository::new(Arc::clone(&store));
        let favorites = load_favorites(&products, &profiles, &user).await.unwrap();
        assert_eq!(favorites.len(), 1);
        assert_eq!(favorites[0].name, "Saia");
    }
}
