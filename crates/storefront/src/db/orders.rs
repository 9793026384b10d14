//! Order repository.

use tracing::{instrument, warn};

use fantasia_core::{OrderId, UserId};

use super::RepositoryError;
use crate::backend::{DocumentQuery, DocumentStore};
use crate::models::order::{COLLECTION, NewOrder, Order};

/// Repository for order documents.
pub struct OrderRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Write a new order and return its generated ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the write fails.
    #[instrument(skip(self, order), fields(user_id = %order.user_id, items = order.items.len()))]
    pub async fn create(&self, order: &NewOrder) -> Result<OrderId, RepositoryError> {
        let id = self.store.create(COLLECTION, order.to_fields()?).await?;
        Ok(OrderId::new(id))
    }

    /// Every order placed by `user_id`, newest first.
    ///
    /// Documents that fail to decode are logged and skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self), fields(user_id = %user_id))]
    pub async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Order>, RepositoryError> {
        let query = DocumentQuery::collection(COLLECTION).where_eq("userId", user_id.as_str());
        let documents = self.store.query(&query).await?;

        let mut orders: Vec<Order> = documents
            .iter()
            .filter_map(|doc| {
                Order::from_document(doc)
                    .inspect_err(|e| warn!(order_id = %doc.id, error = %e, "Skipping malformed order"))
                    .ok()
            })
            .collect();
        orders.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(orders)
    }
}
