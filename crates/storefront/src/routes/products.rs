//! Product route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use fantasia_core::ProductId;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Product;
use crate::models::product::PLACEHOLDER_IMAGE;
use crate::routes::cart::{CART_UPDATED, NoticeTemplate};
use crate::routes::home::FavoriteView;
use crate::services::cart_store;
use crate::services::product::{OptionSelection, validate_options};
use crate::state::AppState;

/// Hint shown in the measurements field of custom orders.
const MEASUREMENTS_HINT: &str = "Coloque aqui suas medidas";

/// Product detail display data for templates.
#[derive(Clone)]
pub struct ProductView {
    pub id: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub image: String,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub is_custom_order: bool,
    pub observation_hint: &'static str,
}

impl From<&Product> for ProductView {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id.to_string(),
            name: product.name.clone(),
            price: product.price.to_string(),
            description: product.description.clone(),
            image: product
                .images
                .first()
                .cloned()
                .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            colors: product.colors.clone(),
            sizes: product.sizes.clone(),
            is_custom_order: product.is_custom_order(),
            observation_hint: MEASUREMENTS_HINT,
        }
    }
}

/// Add-to-cart form data from the detail page.
#[derive(Debug, Default, Deserialize)]
pub struct OptionsForm {
    pub cor: Option<String>,
    pub observacao: Option<String>,
}

impl From<OptionsForm> for OptionSelection {
    fn from(form: OptionsForm) -> Self {
        Self {
            color: form.cor,
            observation: form.observacao,
        }
    }
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "products/show.html")]
pub struct ProductShowTemplate {
    pub product: ProductView,
    pub favorite: FavoriteView,
}

async fn find_product(state: &AppState, id: &str) -> Result<Product, AppError> {
    state
        .products()
        .get(&ProductId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Display product detail page.
#[instrument(skip(state, user))]
pub async fn show(
    State(state): State<AppState>,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<String>,
) -> Result<ProductShowTemplate, AppError> {
    let product = find_product(&state, &id).await?;
    add_breadcrumb("navigation", "Viewed product", Some(&[("product_id", id.as_str())]));

    let favorited = match &user {
        Some(user) => state
            .profiles()
            .favorites(&user.id)
            .await
            .map(|favorites| favorites.contains(&product.id))
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load favorites");
                false
            }),
        None => false,
    };

    Ok(ProductShowTemplate {
        favorite: FavoriteView {
            product_id: product.id.to_string(),
            favorited,
        },
        product: ProductView::from(&product),
    })
}

/// Add the product with the chosen options (HTMX).
///
/// Every accepted submission appends a new line. Refusals are shown next
/// to the form and leave the cart untouched.
#[instrument(skip(state, session, form))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<OptionsForm>,
) -> Result<Response, AppError> {
    let product = find_product(&state, &id).await?;

    let item = match validate_options(&product, &form.into()) {
        Ok(item) => item,
        Err(e) => return Ok(NoticeTemplate::error(e.to_string()).into_response()),
    };

    cart_store::update(&session, |cart| cart.append(item)).await?;
    tracing::info!(product_id = %product.id, "Added to cart with options");

    Ok((
        AppendHeaders([CART_UPDATED]),
        NoticeTemplate::success("Produto adicionado ao carrinho."),
    )
        .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fantasia_core::Price;

    use super::*;
    use crate::models::ProductKind;

    #[test]
    fn test_product_view_for_custom_order() {
        let product = Product {
            id: ProductId::new("p9"),
            name: "Vestido de Noiva".to_string(),
            price: Price::brl("1200".parse().unwrap()),
            description: "Sob medida".to_string(),
            images: vec!["https://img/1.jpg".to_string(), "https://img/2.jpg".to_string()],
            category: Some("Noivas".to_string()),
            kind: ProductKind::CustomOrder,
            sizes: vec!["P".to_string(), "M".to_string()],
            colors: vec!["Branco".to_string()],
        };

        let view = ProductView::from(&product);
        assert_eq!(view.image, "https://img/1.jpg");
        assert_eq!(view.price, "R$ 1200.00");
        assert!(view.is_custom_order);
        assert_eq!(view.sizes, ["P", "M"]);
        assert_eq!(view.observation_hint, MEASUREMENTS_HINT);
    }

    #[test]
    fn test_options_form_maps_portuguese_fields() {
        let selection: OptionSelection = OptionsForm {
            cor: Some("Azul".to_string()),
            observacao: None,
        }
        .into();
        assert_eq!(selection.color.as_deref(), Some("Azul"));
        assert!(selection.observation.is_none());
    }
}
