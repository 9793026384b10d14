//! Order status.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Status of a submitted order.
///
/// Stored as free text on the order document so that fulfillment staff can
/// write any label from the database console. Orders always start out as
/// [`OrderStatus::AWAITING_PAYMENT`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    /// Label written on every new order.
    pub const AWAITING_PAYMENT: &'static str = "Aguardando Pagamento";

    /// Status of a freshly submitted order.
    #[must_use]
    pub fn awaiting_payment() -> Self {
        Self(Self::AWAITING_PAYMENT.to_owned())
    }

    /// Wrap an arbitrary label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The label as stored.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the order is still waiting for payment.
    #[must_use]
    pub fn is_awaiting_payment(&self) -> bool {
        self.0 == Self::AWAITING_PAYMENT
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::awaiting_payment()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_awaiting_payment() {
        assert!(OrderStatus::default().is_awaiting_payment());
        assert_eq!(OrderStatus::default().as_str(), "Aguardando Pagamento");
    }

    #[test]
    fn test_free_text_is_preserved() {
        let status = OrderStatus::new("Enviado");
        assert_eq!(status.to_string(), "Enviado");
        assert!(!status.is_awaiting_payment());
    }
}
