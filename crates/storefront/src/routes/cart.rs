//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The cart lives in the visitor's session; lines are addressed by their
//! stable line id.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use fantasia_core::{LineId, ProductId};

use crate::error::AppError;
use crate::filters;
use crate::models::cart::parse_quantity;
use crate::models::{Cart, CartError, CartItem};
use crate::services::{cart_store, product::catalog_item};
use crate::state::AppState;

/// Event that makes the header badge refresh itself.
pub const CART_UPDATED: (&str, &str) = ("HX-Trigger", "cart-updated");

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub line_id: String,
    pub product_id: String,
    pub name: String,
    pub image: String,
    pub unit_price: String,
    /// `Tamanho: M | Cor: Azul | Detalhes Encomenda: ...`
    pub details: String,
    pub quantity: u32,
    pub line_total: String,
    /// Quantity can only change on plain lines.
    pub quantity_locked: bool,
    pub is_encomenda: bool,
    pub color: String,
    pub available_colors: Vec<String>,
}

impl From<&CartItem> for CartLineView {
    fn from(item: &CartItem) -> Self {
        Self {
            line_id: item.line_id.to_string(),
            product_id: item.id.to_string(),
            name: item.name.clone(),
            image: item
                .image_url
                .clone()
                .unwrap_or_else(|| crate::models::product::PLACEHOLDER_IMAGE.to_string()),
            unit_price: item.unit_price().to_string(),
            details: item.details().join(" | "),
            quantity: item.quantity,
            line_total: item.line_total().to_string(),
            quantity_locked: item.has_options(),
            is_encomenda: item.is_encomenda,
            color: item.color.clone(),
            available_colors: item.available_colors.clone(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub subtotal: String,
    pub total: String,
    pub item_count: u32,
    /// Feedback from the last mutation, if it was refused.
    pub message: Option<String>,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart) -> Self {
        let total = cart.total().to_string();
        Self {
            lines: cart.items().iter().map(CartLineView::from).collect(),
            subtotal: total.clone(),
            total,
            item_count: cart.item_count(),
            message: None,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Plain add form data (from a catalog card).
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveLineForm {
    pub line_id: String,
}

/// Quantity form data. The raw input is parsed leniently.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub line_id: String,
    #[serde(default)]
    pub quantity: String,
}

/// Color change form data.
#[derive(Debug, Deserialize)]
pub struct ColorForm {
    pub line_id: String,
    #[serde(default)]
    pub color: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

/// Short feedback message fragment (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/notice.html")]
pub struct NoticeTemplate {
    pub message: String,
    pub is_error: bool,
}

impl NoticeTemplate {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

fn parse_line_id(raw: &str) -> Result<LineId, AppError> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Item inválido.".to_string()))
}

/// Re-render the cart list after a mutation, with the refusal message if
/// the mutation was rejected.
fn items_response<T>(cart: &Cart, result: Result<T, CartError>) -> Response {
    let view = CartView::new(cart);
    let view = match result {
        Ok(_) => view,
        Err(e) => view.with_message(e.to_string()),
    };
    (AppendHeaders([CART_UPDATED]), CartItemsTemplate { cart: view }).into_response()
}

/// Display cart page.
#[instrument(skip(session))]
pub async fn show(session: Session) -> CartShowTemplate {
    let cart = cart_store::load(&session).await;
    CartShowTemplate {
        cart: CartView::new(&cart),
    }
}

/// Add a plain product from the catalog grid (HTMX).
///
/// Repeated adds of the same product grow one line instead of adding lines.
/// Products with colors and custom orders must go through the detail page.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Response, AppError> {
    let id = ProductId::new(form.product_id);
    let product = state
        .products()
        .get(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(id.to_string()))?;

    let item = match catalog_item(&product) {
        Ok(item) => item,
        Err(e) => return Ok(NoticeTemplate::error(e.to_string()).into_response()),
    };

    cart_store::update(&session, |cart| cart.add(item)).await?;
    tracing::info!(product_id = %id, "Added to cart");

    Ok((
        AppendHeaders([CART_UPDATED]),
        NoticeTemplate::success(format!("{} adicionado ao carrinho!", product.name)),
    )
        .into_response())
}

/// Remove a line (HTMX).
#[instrument(skip(session))]
pub async fn remove(session: Session, Form(form): Form<RemoveLineForm>) -> Result<Response, AppError> {
    let line_id = parse_line_id(&form.line_id)?;
    let (cart, result) = cart_store::update(&session, |cart| cart.remove(line_id)).await?;
    Ok(items_response(&cart, result))
}

/// Set a line's quantity (HTMX).
///
/// Lines with options keep their quantity and the refusal is shown; the
/// re-rendered input shows the unchanged value. Zero or less removes the
/// line.
#[instrument(skip(session))]
pub async fn quantity(session: Session, Form(form): Form<QuantityForm>) -> Result<Response, AppError> {
    let line_id = parse_line_id(&form.line_id)?;
    let value = parse_quantity(&form.quantity);
    let (cart, result) =
        cart_store::update(&session, |cart| cart.set_quantity(line_id, value)).await?;
    Ok(items_response(&cart, result))
}

/// Change a line's color (HTMX).
#[instrument(skip(session))]
pub async fn color(session: Session, Form(form): Form<ColorForm>) -> Result<Response, AppError> {
    let line_id = parse_line_id(&form.line_id)?;
    let (cart, result) =
        cart_store::update(&session, |cart| cart.set_color(line_id, &form.color)).await?;
    Ok(items_response(&cart, result))
}

/// Get cart count badge (HTMX).
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    CartCountTemplate {
        count: cart_store::load(&session).await.item_count(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem::new(ProductId::new("p1"), "Saia", "40".parse().unwrap()));
        let mut custom = CartItem::new(ProductId::new("p2"), "Vestido", "100".parse().unwrap());
        custom.is_encomenda = true;
        custom.color = "Azul".to_string();
        custom.observation = "Busto 90".to_string();
        cart.append(custom);
        cart
    }

    #[test]
    fn test_cart_view_totals_and_details() {
        let view = CartView::new(&cart());
        assert_eq!(view.total, "R$ 140.00");
        assert_eq!(view.item_count, 2);
        assert!(!view.lines[0].quantity_locked);
        assert!(view.lines[1].quantity_locked);
        assert_eq!(view.lines[1].details, "Cor: Azul | Detalhes Encomenda: Busto 90");
        assert_eq!(
            view.lines[0].image,
            crate::models::product::PLACEHOLDER_IMAGE
        );
    }

    #[test]
    fn test_refused_mutation_carries_message() {
        let mut cart = cart();
        let line = cart.items()[1].line_id;
        let result = cart.set_quantity(line, 3);
        assert!(result.is_err());

        let view = CartView::new(&cart).with_message(result.unwrap_err().to_string());
        assert_eq!(view.lines[1].quantity, 1);
        assert!(view.message.unwrap().starts_with("A quantidade de itens personalizados"));
    }

    #[test]
    fn test_parse_line_id_rejects_garbage() {
        assert!(matches!(parse_line_id("abc"), Err(AppError::BadRequest(_))));
        let id = LineId::generate();
        assert_eq!(parse_line_id(&id.to_string()).unwrap(), id);
    }
}
