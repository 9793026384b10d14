//! Checkout and order history.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, instrument};

use fantasia_core::{OrderId, Price, UserId};

use crate::db::{OrderRepository, RepositoryError};
use crate::models::{Cart, CartItem, CurrentUser, NewOrder, Order};

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Checkout requires a signed-in user.
    #[error("Você precisa estar logado para finalizar o pedido.")]
    Unauthenticated,

    /// Nothing to order.
    #[error("Seu carrinho está vazio.")]
    EmptyCart,

    /// Writing or reading orders failed.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// One line of the checkout summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryLine {
    pub quantity: u32,
    pub name: String,
    /// `Tamanho: M | Cor: Azul | Obs: ...`, empty without options.
    pub options: String,
    pub line_total: Price,
}

/// What the checkout page shows before the order is placed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSummary {
    pub lines: Vec<SummaryLine>,
    pub total: Price,
    /// Minimum upfront payment for custom orders (half the total).
    pub deposit: Price,
}

impl CheckoutSummary {
    /// Summarize `cart`.
    #[must_use]
    pub fn from_cart(cart: &Cart) -> Self {
        Self {
            lines: cart.items().iter().map(summary_line).collect(),
            total: cart.total(),
            deposit: cart.deposit(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

fn summary_line(item: &CartItem) -> SummaryLine {
    let options: Vec<String> = [
        ("Tamanho", &item.size),
        ("Cor", &item.color),
        ("Obs", &item.observation),
    ]
    .into_iter()
    .filter(|(_, value)| !value.is_empty())
    .map(|(label, value)| format!("{label}: {value}"))
    .collect();

    SummaryLine {
        quantity: item.quantity,
        name: item.name.clone(),
        options: options.join(" | "),
        line_total: item.line_total(),
    }
}

/// Place an order for the cart's contents and empty the cart.
///
/// The caller persists the emptied cart. On failure the cart is left as it
/// was and nothing is retried.
///
/// # Errors
///
/// Returns `OrderError::Unauthenticated` without a user,
/// `OrderError::EmptyCart` for an empty cart, or `OrderError::Repository`
/// if the write fails.
#[instrument(skip(orders, user, cart), fields(lines = cart.len()))]
pub async fn submit_order(
    orders: &OrderRepository<'_>,
    user: Option<&CurrentUser>,
    cart: &mut Cart,
) -> Result<OrderId, OrderError> {
    let user = user.ok_or(OrderError::Unauthenticated)?;
    if cart.is_empty() {
        return Err(OrderError::EmptyCart);
    }

    let order = NewOrder::from_cart(user.id.clone(), user.email.clone(), cart, Utc::now());
    let order_id = orders.create(&order).await?;
    cart.clear();

    info!(order_id = %order_id, user_id = %user.id, total = %order.total, "Order placed");
    Ok(order_id)
}

/// Every order of the user, newest first.
///
/// # Errors
///
/// Returns `OrderError::Repository` if the query fails.
pub async fn load_orders(
    orders: &OrderRepository<'_>,
    user: &UserId,
) -> Result<Vec<Order>, OrderError> {
    Ok(orders.list_for_user(user).await?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use fantasia_core::{Email, ProductId};

    use super::*;
    use crate::backend::MemoryDocumentStore;

    fn user() -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            email: Email::parse("ana@example.com").unwrap(),
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::new();
        cart.add(CartItem::new(ProductId::new("p1"), "Saia", "45.50".parse().unwrap()));
        let mut custom = CartItem::new(ProductId::new("p2"), "Vestido", "200".parse().unwrap());
        custom.is_encomenda = true;
        custom.color = "Azul".to_string();
        custom.observation = "Busto 90".to_string();
        cart.append(custom);
        cart
    }

    #[test]
    fn test_checkout_summary() {
        let summary = CheckoutSummary::from_cart(&cart());
        assert_eq!(summary.lines[0].options, "");
        assert_eq!(summary.lines[1].options, "Cor: Azul | Obs: Busto 90");
        assert_eq!(summary.total.to_string(), "R$ 245.50");
        assert_eq!(summary.deposit.to_string(), "R$ 122.75");
    }

    #[tokio::test]
    async fn test_submit_requires_user_and_items() {
        let store = MemoryDocumentStore::new();
        let orders = OrderRepository::new(&store);

        let mut full = cart();
        let err = submit_order(&orders, None, &mut full).await.unwrap_err();
        assert!(matches!(err, OrderError::Unauthenticated));
        assert_eq!(full.len(), 2);

        let mut empty = Cart::new();
        let err = submit_order(&orders, Some(&user()), &mut empty).await.unwrap_err();
        assert!(matches!(err, OrderError::EmptyCart));
        assert_eq!(store.count("pedidos").await, 0);
    }

    #[tokio::test]
    async fn test_submit_clears_cart_and_records_order() {
        let store = MemoryDocumentStore::new();
        let orders = OrderRepository::new(&store);
        let mut cart = cart();

        let id = submit_order(&orders, Some(&user()), &mut cart).await.unwrap();
        assert!(cart.is_empty());
        assert!(cart.total().is_zero());

        let history = load_orders(&orders, &UserId::new("u1")).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
        assert_eq!(history[0].total.to_string(), "R$ 245.50");
        assert!(history[0].status.is_awaiting_payment());
    }
}
