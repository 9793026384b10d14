//! Catalog (home page) route handlers.
//!
//! The grid is loaded through the visitor's [`CatalogSession`], which keeps
//! the filters and the pagination cursor between the first page and the
//! "load more" fragments.
//!
//! [`CatalogSession`]: crate::services::catalog::CatalogSession

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{OptionalAuth, catalog_token};
use crate::models::Product;
use crate::services::catalog::{
    CatalogFilters, FilterOptions, LoadMode, LoadOutcome, ProductCard, filter_options,
};
use crate::state::AppState;

const EMPTY_CATALOG: &str = "Nenhum produto encontrado.";
const EMPTY_FILTERED: &str = "Nenhum produto encontrado com os filtros selecionados.";
const LOAD_FAILED: &str = "Erro ao carregar produtos. Tente novamente mais tarde.";

/// Favorite toggle state of one product.
#[derive(Clone)]
pub struct FavoriteView {
    pub product_id: String,
    pub favorited: bool,
}

/// Product card display data for templates.
#[derive(Clone)]
pub struct ProductCardView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub image: String,
    /// Products with colors are added from the detail page.
    pub needs_details: bool,
    pub favorite: FavoriteView,
}

impl ProductCardView {
    #[must_use]
    pub fn new(product: &Product, favorited: bool) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            image: product.cover_image().to_string(),
            needs_details: product.needs_details(),
            favorite: FavoriteView {
                product_id: product.id.to_string(),
                favorited,
            },
        }
    }
}

impl From<&ProductCard> for ProductCardView {
    fn from(card: &ProductCard) -> Self {
        let mut view = Self::new(&card.product, card.favorited);
        view.needs_details = card.needs_details();
        view
    }
}

/// Grid contents for templates.
#[derive(Clone, Default)]
pub struct GridView {
    pub cards: Vec<ProductCardView>,
    pub has_more: bool,
    /// Replaces the grid when set.
    pub message: Option<&'static str>,
}

impl GridView {
    fn from_outcome(outcome: LoadOutcome) -> Self {
        match outcome {
            LoadOutcome::Page { cards, has_more } => Self {
                cards: cards.iter().map(ProductCardView::from).collect(),
                has_more,
                message: None,
            },
            LoadOutcome::Empty { filtered } => Self {
                message: Some(if filtered { EMPTY_FILTERED } else { EMPTY_CATALOG }),
                ..Self::default()
            },
            LoadOutcome::Suppressed => Self::default(),
        }
    }

    fn failed() -> Self {
        Self {
            message: Some(LOAD_FAILED),
            ..Self::default()
        }
    }
}

/// Selected filter values, echoed back into the filter form.
#[derive(Clone, Default)]
pub struct FilterView {
    pub category: String,
    pub color: String,
    pub sort: &'static str,
}

impl From<&CatalogFilters> for FilterView {
    fn from(filters: &CatalogFilters) -> Self {
        Self {
            category: filters.category.clone().unwrap_or_default(),
            color: filters.color.clone().unwrap_or_default(),
            sort: filters.sort.as_param(),
        }
    }
}

/// Catalog query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub categoria: Option<String>,
    pub cor: Option<String>,
    pub ordem: Option<String>,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub filters: FilterView,
    pub options: FilterOptions,
    pub grid: GridView,
}

/// Next catalog page fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/catalog_page.html")]
pub struct CatalogPageTemplate {
    pub grid: GridView,
}

/// Display the catalog with the requested filters.
///
/// Each visit starts a fresh load: the cursor is reset and the first page
/// replaces whatever the session showed before.
#[instrument(skip(state, session, user))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Query(params): Query<CatalogParams>,
) -> Result<HomeTemplate, AppError> {
    let filters = CatalogFilters::from_params(
        params.categoria.as_deref(),
        params.cor.as_deref(),
        params.ordem.as_deref(),
    );

    let token = catalog_token(&session).await?;
    let catalog = state.catalog_sessions().get_or_create(&token).await;

    let options = filter_options(state.products()).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load filter options");
        FilterOptions::default()
    });

    let grid = match catalog
        .load(
            state.products(),
            &state.profiles(),
            user.as_ref().map(|u| &u.id),
            LoadMode::Fresh(filters.clone()),
        )
        .await
    {
        Ok(outcome) => GridView::from_outcome(outcome),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load catalog");
            GridView::failed()
        }
    };

    Ok(HomeTemplate {
        filters: FilterView::from(&filters),
        options,
        grid,
    })
}

/// Append the next page to the grid (HTMX).
///
/// Answers `204 No Content` while a previous load is still running, so a
/// double click does not fetch the same page twice.
#[instrument(skip(state, session, user))]
pub async fn more(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response, AppError> {
    let token = catalog_token(&session).await?;
    let catalog = state.catalog_sessions().get_or_create(&token).await;

    let outcome = catalog
        .load(
            state.products(),
            &state.profiles(),
            user.as_ref().map(|u| &u.id),
            LoadMode::More,
        )
        .await;

    match outcome {
        Ok(LoadOutcome::Suppressed) => Ok(StatusCode::NO_CONTENT.into_response()),
        Ok(outcome) => Ok(CatalogPageTemplate {
            grid: GridView::from_outcome(outcome),
        }
        .into_response()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load next catalog page");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fantasia_core::{Price, ProductId};

    use super::*;
    use crate::models::ProductKind;

    fn product(colors: &[&str]) -> Product {
        Product {
            id: ProductId::new("p1"),
            name: "Vestido".to_string(),
            price: Price::brl("89.9".parse().unwrap()),
            description: String::new(),
            images: Vec::new(),
            category: None,
            kind: ProductKind::Standard,
            sizes: Vec::new(),
            colors: colors.iter().map(ToString::to_string).collect(),
        }
    }

    #[test]
    fn test_empty_outcome_messages() {
        let grid = GridView::from_outcome(LoadOutcome::Empty { filtered: false });
        assert_eq!(grid.message, Some(EMPTY_CATALOG));

        let grid = GridView::from_outcome(LoadOutcome::Empty { filtered: true });
        assert_eq!(grid.message, Some(EMPTY_FILTERED));
    }

    #[test]
    fn test_card_view_links_colored_products_to_details() {
        let card = ProductCard {
            product: product(&["Azul"]),
            favorited: true,
        };
        let view = ProductCardView::from(&card);
        assert!(view.needs_details);
        assert!(view.favorite.favorited);
        assert_eq!(view.price, "R$ 89.90");
        assert_eq!(view.image, crate::models::product::PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_card_view_links_custom_orders_to_details() {
        let mut custom = product(&[]);
        custom.kind = ProductKind::CustomOrder;
        assert!(ProductCardView::new(&custom, false).needs_details);
        let card = ProductCard {
            product: custom,
            favorited: false,
        };
        assert!(ProductCardView::from(&card).needs_details);
        assert!(!ProductCardView::new(&product(&[]), false).needs_details);
    }

    #[test]
    fn test_filter_view_echoes_params() {
        let filters = CatalogFilters::from_params(Some("Vestidos"), None, Some("asc"));
        let view = FilterView::from(&filters);
        assert_eq!(view.category, "Vestidos");
        assert_eq!(view.color, "");
        assert_eq!(view.sort, "asc");
    }
}
