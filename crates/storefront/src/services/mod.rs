//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Sign-in, registration and password reset
//! - `catalog` - Per-visitor catalog sessions (filters, pagination, in-flight guard)
//! - `product` - Product option validation before adding to the cart
//! - `cart_store` - Cart persistence in the visitor's session
//! - `favorites` - Favorite toggling and the favorites grid
//! - `orders` - Checkout summary, order submission and history

pub mod auth;
pub mod cart_store;
pub mod catalog;
pub mod favorites;
pub mod orders;
pub mod product;
