//! Domain models for the storefront.
//!
//! Each stored model knows its collection and how to decode itself from a
//! [`Document`](crate::backend::Document).

pub mod cart;
pub mod order;
pub mod product;
pub mod profile;
pub mod session;

pub use cart::{Cart, CartError, CartItem, QuantityChange};
pub use order::{NewOrder, Order, OrderLine};
pub use product::{Product, ProductKind};
pub use profile::Profile;
pub use session::{CurrentUser, keys as session_keys};
