//! HTTP route handlers for the storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Catalog (filters: categoria, cor, ordem)
//! GET  /catalog/more           - Next catalog page (fragment)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products/{id}          - Product detail
//! POST /products/{id}/cart     - Add to cart with options (fragment)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Plain add from a catalog card
//! POST /cart/remove            - Remove line (returns cart_items fragment)
//! POST /cart/quantity          - Set quantity (returns cart_items fragment)
//! POST /cart/color             - Set color (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//!
//! # Checkout
//! GET  /checkout               - Summary with total and deposit
//! POST /checkout               - Place order
//!
//! # Favorites
//! POST /favorites/{id}         - Toggle favorite (returns button fragment)
//!
//! # Account
//! GET  /account                - Profile, orders and favorites (or sign-in prompt)
//!
//! # Auth
//! GET  /auth/login             - Sign-in / register form (?mode=register)
//! POST /auth/login             - Sign-in action
//! POST /auth/register          - Register action
//! POST /auth/forgot-password   - Send password reset email
//! POST /auth/logout            - Sign-out action
//! ```

pub mod account;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod favorites;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", post(auth::register))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/logout", post(auth::logout))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(products::show))
        .route("/{id}/cart", post(products::add_to_cart))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/quantity", post(cart::quantity))
        .route("/color", post(cart::color))
        .route("/count", get(cart::count))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/catalog/more", get(home::more))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .route("/checkout", get(checkout::show).post(checkout::submit))
        .route("/favorites/{id}", post(favorites::toggle))
        .route("/account", get(account::index))
        .nest("/auth", auth_routes())
}
