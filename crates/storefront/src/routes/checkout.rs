//! Checkout route handlers.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{AppendHeaders, IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, add_breadcrumb};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::Cart;
use crate::routes::cart::CART_UPDATED;
use crate::services::cart_store;
use crate::services::orders::{CheckoutSummary, OrderError, submit_order};
use crate::state::AppState;

const ORDER_FAILED: &str = "Ocorreu um erro ao finalizar o pedido. Tente novamente.";

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub summary: CheckoutSummary,
    pub signed_in: bool,
    pub error: Option<String>,
}

/// Order confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/success.html")]
pub struct OrderPlacedTemplate {
    /// First eight characters of the order id.
    pub order_number: String,
}

/// Display the checkout summary: lines, total and the 50% deposit.
#[instrument(skip(session, user))]
pub async fn show(session: Session, OptionalAuth(user): OptionalAuth) -> CheckoutTemplate {
    let cart = cart_store::load(&session).await;
    CheckoutTemplate {
        summary: CheckoutSummary::from_cart(&cart),
        signed_in: user.is_some(),
        error: None,
    }
}

/// Place the order and empty the cart.
///
/// Refusals and write failures re-render the summary with a message; the
/// cart is kept so the visitor can try again. Once the order is written the
/// confirmation is shown even if the emptied cart cannot be saved.
#[instrument(skip(state, session, user))]
pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
) -> Result<Response, AppError> {
    let mut cart = cart_store::load(&session).await;

    match submit_order(&state.orders(), user.as_ref(), &mut cart).await {
        Ok(order_id) => {
            save_emptied_cart(&session, &cart, order_id.as_str()).await;
            add_breadcrumb("checkout", "Order placed", Some(&[("order_id", order_id.as_str())]));
            Ok((
                AppendHeaders([CART_UPDATED]),
                OrderPlacedTemplate {
                    order_number: order_id.short().to_string(),
                },
            )
                .into_response())
        }
        Err(e) => {
            let message = match &e {
                OrderError::Repository(inner) => {
                    tracing::error!(error = %inner, "Failed to place order");
                    ORDER_FAILED.to_string()
                }
                OrderError::Unauthenticated | OrderError::EmptyCart => e.to_string(),
            };
            Ok(CheckoutTemplate {
                summary: CheckoutSummary::from_cart(&cart),
                signed_in: user.is_some(),
                error: Some(message),
            }
            .into_response())
        }
    }
}

/// Persist the cart emptied by a placed order.
///
/// A failure is logged, never returned: the order already exists and an
/// error page would invite a second submission.
async fn save_emptied_cart(session: &Session, cart: &Cart, order_id: &str) {
    if let Err(e) = cart_store::save(session, cart).await {
        tracing::error!(error = %e, order_id, "Order placed but the cart could not be emptied");
    }
}
