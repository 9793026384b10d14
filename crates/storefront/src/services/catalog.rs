//! Catalog browsing: filters, sorting and cursor pagination per visitor.
//!
//! Each visitor owns a [`CatalogSession`] holding the active filters, the
//! cursor after the last fetched product, the visitor's cached favorites and
//! the in-flight guard. Sessions live in a [`CatalogSessions`] registry keyed
//! by a random token stored in the visitor's HTTP session.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use fantasia_core::{ProductId, UserId};

use crate::backend::Cursor;
use crate::db::{CatalogQuery, ProductRepository, ProfileRepository, RepositoryError, SortMode};
use crate::models::Product;

// =============================================================================
// Filters
// =============================================================================

/// Filters and ordering chosen by the visitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFilters {
    /// Exact category match, applied by the database.
    pub category: Option<String>,
    /// Color membership, applied to each fetched page.
    pub color: Option<String>,
    pub sort: SortMode,
}

impl CatalogFilters {
    /// Build filters from raw query parameters; blank values mean "any".
    #[must_use]
    pub fn from_params(category: Option<&str>, color: Option<&str>, sort: Option<&str>) -> Self {
        let non_blank = |v: Option<&str>| {
            v.map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        Self {
            category: non_blank(category),
            color: non_blank(color),
            sort: sort.map(SortMode::from_param).unwrap_or_default(),
        }
    }

    /// Whether a category or color filter is active.
    #[must_use]
    pub const fn is_filtered(&self) -> bool {
        self.category.is_some() || self.color.is_some()
    }

    fn query(&self) -> CatalogQuery {
        CatalogQuery {
            category: self.category.clone(),
            sort: self.sort,
        }
    }

    fn keeps(&self, product: &Product) -> bool {
        self.color
            .as_deref()
            .is_none_or(|color| product.offers_color(color))
    }
}

/// Values offered in the filter selects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub colors: Vec<String>,
}

impl FilterOptions {
    /// Distinct, trimmed, non-empty categories and colors, sorted.
    #[must_use]
    pub fn from_products(products: &[Product]) -> Self {
        let categories: BTreeSet<String> = products
            .iter()
            .filter_map(|p| p.category.as_deref())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
            .collect();
        let colors: BTreeSet<String> = products
            .iter()
            .flat_map(|p| p.colors.iter())
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_owned)
            .collect();
        Self {
            categories: categories.into_iter().collect(),
            colors: colors.into_iter().collect(),
        }
    }
}

/// Load the filter options from the whole catalog.
///
/// # Errors
///
/// Returns `RepositoryError` if the catalog cannot be read.
pub async fn filter_options(products: &ProductRepository) -> Result<FilterOptions, RepositoryError> {
    Ok(FilterOptions::from_products(&products.all().await?))
}

// =============================================================================
// Loading
// =============================================================================

/// How a load relates to what is already shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadMode {
    /// Apply new filters: forget the cursor and replace the grid.
    Fresh(CatalogFilters),
    /// Continue after the cursor with the active filters and append.
    More,
}

/// A product as shown in the grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductCard {
    pub product: Product,
    pub favorited: bool,
}

impl ProductCard {
    /// Whether the card links to the detail page instead of adding directly.
    #[must_use]
    pub fn needs_details(&self) -> bool {
        self.product.needs_details()
    }
}

/// Result of a catalog load.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Products to show. `has_more` is set when the database returned a full
    /// page, whether or not the color filter kept all of it.
    Page {
        cards: Vec<ProductCard>,
        has_more: bool,
    },
    /// Nothing to show on a fresh load; `filtered` selects the message.
    Empty { filtered: bool },
    /// Another load of the same session was still running.
    Suppressed,
}

#[derive(Debug, Default)]
struct SessionState {
    filters: CatalogFilters,
    cursor: Option<Cursor>,
    favorites: Option<CachedFavorites>,
}

/// Favorites read from one user's profile.
#[derive(Debug)]
struct CachedFavorites {
    owner: UserId,
    ids: Vec<ProductId>,
}

/// Catalog state of one visitor.
#[derive(Debug, Default)]
pub struct CatalogSession {
    loading: AtomicBool,
    state: Mutex<SessionState>,
}

/// Clears the in-flight flag when dropped, on every exit path.
struct LoadGuard<'a>(&'a AtomicBool);

impl<'a> LoadGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl CatalogSession {
    /// A session with no filters and no cursor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Record a favorite toggle in the cached favorites.
    ///
    /// "Load more" pages mark cards from the cache, so this keeps them in
    /// step with the toggle. Ignored when the cache belongs to someone else.
    pub async fn set_favorite(&self, user: &UserId, product: &ProductId, favorited: bool) {
        let mut state = self.state.lock().await;
        let Some(cached) = state.favorites.as_mut().filter(|c| &c.owner == user) else {
            return;
        };
        cached.ids.retain(|id| id != product);
        if favorited {
            cached.ids.push(product.clone());
        }
    }

    /// Load a page of the catalog.
    ///
    /// At most one load per session runs at a time; a load started while
    /// another is running returns [`LoadOutcome::Suppressed`] without
    /// touching the database.
    ///
    /// Favorites are read from the profile on a fresh load and cached;
    /// "load more" reuses the cache while the same user is signed in.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the catalog query fails. The cursor is
    /// left where it was.
    #[instrument(skip(self, products, profiles))]
    pub async fn load(
        &self,
        products: &ProductRepository,
        profiles: &ProfileRepository<'_>,
        user: Option<&UserId>,
        mode: LoadMode,
    ) -> Result<LoadOutcome, RepositoryError> {
        let Some(_guard) = LoadGuard::acquire(&self.loading) else {
            debug!("Catalog load already in flight");
            return Ok(LoadOutcome::Suppressed);
        };

        let fresh = matches!(mode, LoadMode::Fresh(_));
        let (filters, cursor, cached) = {
            let mut state = self.state.lock().await;
            if let LoadMode::Fresh(filters) = mode {
                state.filters = filters;
                state.cursor = None;
                state.favorites = None;
            }
            let cached = state
                .favorites
                .as_ref()
                .filter(|c| Some(&c.owner) == user)
                .map(|c| c.ids.clone());
            (state.filters.clone(), state.cursor.clone(), cached)
        };

        let favorites = match (user, cached) {
            (None, _) => Vec::new(),
            (Some(_), Some(ids)) => ids,
            (Some(uid), None) => {
                let ids = profiles.favorites(uid).await.unwrap_or_else(|e| {
                    warn!(error = %e, "Failed to load favorites");
                    Vec::new()
                });
                self.state.lock().await.favorites = Some(CachedFavorites {
                    owner: uid.clone(),
                    ids: ids.clone(),
                });
                ids
            }
        };

        let page = products.page(&filters.query(), cursor).await?;
        let has_more = page.is_full();
        let fetched = page.products.len();

        {
            let mut state = self.state.lock().await;
            if page.next_cursor.is_some() {
                state.cursor = page.next_cursor;
            }
        }

        if fetched == 0 && fresh {
            return Ok(LoadOutcome::Empty {
                filtered: filters.is_filtered(),
            });
        }

        let cards: Vec<ProductCard> = page
            .products
            .into_iter()
            .filter(|p| filters.keeps(p))
            .map(|product| ProductCard {
                favorited: favorites.contains(&product.id),
                product,
            })
            .collect();

        if cards.is_empty() && fresh {
            return Ok(LoadOutcome::Empty { filtered: true });
        }

        debug!(fetched, shown = cards.len(), has_more, "Catalog page loaded");
        Ok(LoadOutcome::Page { cards, has_more })
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Catalog sessions of all visitors, evicted after 30 idle minutes.
#[derive(Clone)]
pub struct CatalogSessions {
    sessions: Cache<String, Arc<CatalogSession>>,
}

impl Default for CatalogSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogSessions {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(10_000)
                .time_to_idle(Duration::from_secs(30 * 60))
                .build(),
        }
    }

    /// The session for `token`, created on first use.
    pub async fn get_or_create(&self, token: &str) -> Arc<CatalogSession> {
        self.sessions
            .get_with(token.to_string(), async { Arc::new(CatalogSession::new()) })
            .await
    }
}
