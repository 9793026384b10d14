//! Product repository.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use fantasia_core::ProductId;

use super::RepositoryError;
use crate::backend::{Cursor, Direction, DocumentQuery, DocumentStore};
use crate::models::Product;
use crate::models::product::COLLECTION;

/// Products fetched per catalog page.
pub const PAGE_SIZE: usize = 8;

/// Catalog ordering selected by the visitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    /// Newest first (document key descending).
    #[default]
    Recent,
    /// Cheapest first.
    PriceAsc,
    /// Most expensive first.
    PriceDesc,
}

impl SortMode {
    /// Parse the `ordem` query parameter. Unknown values mean [`SortMode::Recent`].
    #[must_use]
    pub fn from_param(value: &str) -> Self {
        match value {
            "asc" => Self::PriceAsc,
            "desc" => Self::PriceDesc,
            _ => Self::Recent,
        }
    }

    /// Value of the `ordem` query parameter.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Recent => "recentes",
            Self::PriceAsc => "asc",
            Self::PriceDesc => "desc",
        }
    }
}

/// Database-side part of a catalog request.
///
/// The color filter is not part of it: it is applied to each fetched page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    pub category: Option<String>,
    pub sort: SortMode,
}

impl CatalogQuery {
    fn to_document_query(&self, after: Option<Cursor>) -> DocumentQuery {
        let mut query = DocumentQuery::collection(COLLECTION);
        if let Some(category) = &self.category {
            query = query.where_eq("categoria", category.as_str());
        }
        query = match self.sort {
            SortMode::Recent => query.order_by_id(Direction::Descending),
            SortMode::PriceAsc => query.order_by_field("preco", Direction::Ascending),
            SortMode::PriceDesc => query.order_by_field("preco", Direction::Descending),
        };
        query.start_after(after).limit(PAGE_SIZE)
    }
}

/// One page of the catalog as returned by the database.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Position of the last product, if the page is non-empty.
    pub next_cursor: Option<Cursor>,
}

impl ProductPage {
    /// Whether the page was full, meaning more products may follow.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.products.len() == PAGE_SIZE
    }
}

/// Repository for catalog reads.
///
/// Single products are cached for 5 minutes; listings always hit the
/// database.
#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn DocumentStore>,
    cache: Cache<ProductId, Product>,
}

impl ProductRepository {
    /// Create a new product repository.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();
        Self { store, cache }
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the read fails or the document
    /// is malformed.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        if let Some(product) = self.cache.get(id).await {
            debug!("Cache hit for product");
            return Ok(Some(product));
        }

        let Some(document) = self.store.get(COLLECTION, id.as_str()).await? else {
            return Ok(None);
        };
        let product = Product::from_document(&document)?;
        self.cache.insert(id.clone(), product.clone()).await;
        Ok(Some(product))
    }

    /// Fetch one catalog page, resuming after `after`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self, after), fields(category = ?query.category, sort = ?query.sort))]
    pub async fn page(
        &self,
        query: &CatalogQuery,
        after: Option<Cursor>,
    ) -> Result<ProductPage, RepositoryError> {
        let document_query = query.to_document_query(after);
        let documents = self.store.query(&document_query).await?;

        let next_cursor = documents
            .last()
            .map(|doc| Cursor::after(doc, document_query.order_by.as_ref()));
        let products = documents
            .iter()
            .map(Product::from_document)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(count = products.len(), "Fetched catalog page");
        Ok(ProductPage {
            products,
            next_cursor,
        })
    }

    /// Every product in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Backend` if the query fails.
    #[instrument(skip(self))]
    pub async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        let documents = self
            .store
            .query(&DocumentQuery::collection(COLLECTION))
            .await?;
        Ok(documents
            .iter()
            .map(Product::from_document)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Map, Value, json};

    use super::*;
    use crate::backend::MemoryDocumentStore;

    fn fields(value: Value) -> Map<String, Value> {
        let Value::Object(map) = value else {
            panic!("fields must be an object");
        };
        map
    }

    fn catalog(count: usize) -> Arc<dyn DocumentStore> {
        Arc::new(MemoryDocumentStore::with_documents(
            COLLECTION,
            (0..count).map(|i| {
                (
                    format!("p{i:02}"),
                    fields(json!({"nome": format!("Produto {i}"), "preco": 10 + i})),
                )
            }),
        ))
    }

    #[test]
    fn test_sort_mode_params() {
        assert_eq!(SortMode::from_param("asc"), SortMode::PriceAsc);
        assert_eq!(SortMode::from_param("desc"), SortMode::PriceDesc);
        assert_eq!(SortMode::from_param("recentes"), SortMode::Recent);
        assert_eq!(SortMode::from_param("???"), SortMode::Recent);
        assert_eq!(SortMode::PriceDesc.as_param(), "desc");
    }

    #[tokio::test]
    async fn test_pages_resume_after_cursor() {
        let repo = ProductRepository::new(catalog(11));
        let query = CatalogQuery {
            category: None,
            sort: SortMode::PriceAsc,
        };

        let first = repo.page(&query, None).await.unwrap();
        assert!(first.is_full());
        assert_eq!(first.products.first().unwrap().id.as_str(), "p00");

        let second = repo.page(&query, first.next_cursor).await.unwrap();
        assert!(!second.is_full());
        let ids: Vec<&str> = second.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p08", "p09", "p10"]);
    }

    #[tokio::test]
    async fn test_recent_orders_by_key_descending() {
        let repo = ProductRepository::new(catalog(3));
        let page = repo.page(&CatalogQuery::default(), None).await.unwrap();
        let ids: Vec<&str> = page.products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["p02", "p01", "p00"]);
    }

    #[tokio::test]
    async fn test_get_caches_and_misses() {
        let repo = ProductRepository::new(catalog(1));
        let id = ProductId::new("p00");
        assert_eq!(repo.get(&id).await.unwrap().unwrap().name, "Produto 0");
        assert_eq!(repo.get(&id).await.unwrap().unwrap().name, "Produto 0");
        assert!(repo.get(&ProductId::new("nope")).await.unwrap().is_none());
    }
}
