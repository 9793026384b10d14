//! Core types for the storefront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod password;
pub mod price;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use password::{NewPassword, PasswordError};
pub use price::{CurrencyCode, Price};
pub use status::OrderStatus;
