//! Fantasia Eterna Core - Shared domain types.
//!
//! This crate provides the types used by the storefront and its tests:
//! document identifiers, prices, emails, order statuses, and the
//! registration password policy.
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no
//! session handling. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails, passwords and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
