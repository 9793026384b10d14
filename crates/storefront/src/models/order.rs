//! Orders written at checkout.

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use fantasia_core::{Email, OrderId, OrderStatus, Price, UserId};

use super::cart::{Cart, CartItem};
use crate::backend::{BackendError, Document};

/// Collection holding orders.
pub const COLLECTION: &str = "pedidos";

/// An order about to be written: a snapshot of the cart at submit time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub user_id: UserId,
    pub email: Email,
    pub items: Vec<CartItem>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    /// ISO-8601 timestamp with millisecond precision.
    pub date: String,
    pub status: OrderStatus,
}

impl NewOrder {
    /// Snapshot `cart` for `user_id` at `now`.
    #[must_use]
    pub fn from_cart(user_id: UserId, email: Email, cart: &Cart, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            email,
            items: cart.items().to_vec(),
            total: cart.total().amount,
            date: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            status: OrderStatus::awaiting_payment(),
        }
    }

    /// Document fields for the database.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Parse` if serialization fails.
    pub fn to_fields(&self) -> Result<Map<String, Value>, BackendError> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(BackendError::Malformed {
                document: COLLECTION.to_string(),
                reason: format!("order serialized to {other}"),
            }),
        }
    }
}

/// Item of a stored order as shown in the history.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderLine {
    #[serde(default, alias = "nome")]
    pub name: String,
    #[serde(default, alias = "quantidade")]
    pub quantity: u32,
}

/// A stored order.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub email: String,
    pub items: Vec<OrderLine>,
    pub total: Price,
    pub date: String,
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderDocument {
    user_id: UserId,
    #[serde(default)]
    email: String,
    #[serde(default)]
    items: Vec<OrderLine>,
    #[serde(default)]
    total: Option<Decimal>,
    #[serde(default)]
    date: String,
    #[serde(default)]
    status: OrderStatus,
}

impl Order {
    /// Decode an order from its document.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Malformed` if the document has no `userId` or
    /// a field has the wrong type.
    pub fn from_document(document: &Document) -> Result<Self, BackendError> {
        let stored: OrderDocument = document.decode()?;
        Ok(Self {
            id: OrderId::new(document.id.clone()),
            user_id: stored.user_id,
            email: stored.email,
            items: stored.items,
            total: Price::brl(stored.total.unwrap_or_default()),
            date: stored.date,
            status: stored.status,
        })
    }

    /// Order date as `dd/mm/yyyy`, or the raw value if it does not parse.
    #[must_use]
    pub fn display_date(&self) -> String {
        DateTime::parse_from_rfc3339(&self.date).map_or_else(
            |_| self.date.clone(),
            |d| d.with_timezone(&Utc).format("%d/%m/%Y").to_string(),
        )
    }
}
