//! Fantasia Eterna storefront library.
//!
//! This crate provides the storefront functionality as a library,
//! allowing it to be tested and reused.
//!
//! # Layers
//!
//! - [`backend`] - Document database and identity provider ports, with
//!   Firebase REST and in-memory adapters
//! - [`db`] - Repositories for products, orders and profiles
//! - [`models`] - Products, cart, orders and session types
//! - [`services`] - Catalog sessions, cart rules, checkout, favorites, auth
//! - [`routes`] - Axum handlers and Askama templates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
