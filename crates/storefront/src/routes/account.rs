//! Account route handler.
//!
//! Shows the profile, order history and favorites of the signed-in user,
//! or a sign-in prompt.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tracing::instrument;

use crate::filters;
use crate::middleware::OptionalAuth;
use crate::models::{CurrentUser, Order};
use crate::routes::home::ProductCardView;
use crate::services::favorites::load_favorites;
use crate::services::orders::load_orders;
use crate::state::AppState;

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    /// First eight characters of the order id.
    pub number: String,
    pub date: String,
    pub total: String,
    pub status: String,
    /// `(name, quantity)` of each item.
    pub items: Vec<(String, u32)>,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            number: order.id.short().to_string(),
            date: order.display_date(),
            total: order.total.to_string(),
            status: order.status.to_string(),
            items: order
                .items
                .iter()
                .map(|line| (line.name.clone(), line.quantity))
                .collect(),
        }
    }
}

/// A section that loads independently and may fail on its own.
#[derive(Clone)]
pub enum Section<T> {
    Loaded(Vec<T>),
    Failed,
}

/// Profile data for the signed-in user.
pub struct ProfileView {
    pub email: String,
    pub orders: Section<OrderView>,
    pub favorites: Section<ProductCardView>,
}

/// Account page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/index.html")]
pub struct AccountTemplate {
    /// `None` renders the sign-in prompt.
    pub profile: Option<ProfileView>,
}

async fn profile_view(state: &AppState, user: &CurrentUser) -> ProfileView {
    let orders = match load_orders(&state.orders(), &user.id).await {
        Ok(orders) => Section::Loaded(orders.iter().map(OrderView::from).collect()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load order history");
            Section::Failed
        }
    };

    let favorites = match load_favorites(state.products(), &state.profiles(), &user.id).await {
        Ok(products) => Section::Loaded(
            products
                .iter()
                .map(|product| ProductCardView::new(product, true))
                .collect(),
        ),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load favorites");
            Section::Failed
        }
    };

    ProfileView {
        email: user.email.to_string(),
        orders,
        favorites,
    }
}

/// Display the account page.
#[instrument(skip(state, user))]
pub async fn index(State(state): State<AppState>, OptionalAuth(user): OptionalAuth) -> AccountTemplate {
    let profile = match &user {
        Some(user) => Some(profile_view(&state, user).await),
        None => None,
    };
    AccountTemplate { profile }
}
