//! Shopping cart held in the visitor's session.
//!
//! The cart is a plain ordered list of lines, serialized wholesale under a
//! single session key. Lines are addressed by a stable [`LineId`]; the
//! positional operations exist for callers that still think in indexes and
//! follow exactly the same rules.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use fantasia_core::{LineId, Price, ProductId};

/// Errors from cart mutations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CartError {
    /// No line with the given id or index.
    #[error("Item não encontrado no carrinho.")]
    LineNotFound,

    /// Quantity is fixed on lines carrying options or a custom order.
    #[error(
        "A quantidade de itens personalizados não pode ser alterada diretamente. \
         Remova e adicione novamente se necessário."
    )]
    CustomizedQuantity,

    /// A color change must name a color.
    #[error("Selecione uma cor.")]
    EmptyColor,

    /// The color is not one the product offered.
    #[error("Cor indisponível para este produto.")]
    UnknownColor,
}

/// Largest quantity a single line can hold.
pub const MAX_QUANTITY: u32 = 999;

/// One line of the cart.
///
/// Empty `size`, `color` and `observation` mean "not chosen". Field names
/// are camelCase on the wire because order documents embed these lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(default)]
    pub line_id: LineId,
    pub id: ProductId,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub is_encomenda: bool,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub observation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Colors the product offered when added; drives in-cart color edits.
    #[serde(default)]
    pub available_colors: Vec<String>,
}

impl CartItem {
    /// A single unit of a product with no options chosen.
    #[must_use]
    pub fn new(id: ProductId, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            line_id: LineId::generate(),
            id,
            name: name.into(),
            price,
            quantity: 1,
            is_encomenda: false,
            size: String::new(),
            color: String::new(),
            observation: String::new(),
            image_url: None,
            available_colors: Vec::new(),
        }
    }

    /// Whether the line carries a custom-order flag or any chosen option.
    #[must_use]
    pub fn has_options(&self) -> bool {
        self.is_encomenda
            || !self.size.is_empty()
            || !self.color.is_empty()
            || !self.observation.is_empty()
    }

    /// Price of one unit.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::brl(self.price)
    }

    /// Price of the whole line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price().times(self.quantity)
    }

    /// Human-readable option labels, in display order.
    #[must_use]
    pub fn details(&self) -> Vec<String> {
        let mut details = Vec::new();
        if !self.size.is_empty() {
            details.push(format!("Tamanho: {}", self.size));
        }
        if !self.color.is_empty() {
            details.push(format!("Cor: {}", self.color));
        }
        if !self.observation.is_empty() {
            details.push(format!("Detalhes Encomenda: {}", self.observation));
        }
        details
    }

    fn merges_with(&self, other: &Self) -> bool {
        self.id == other.id && !self.has_options() && !other.has_options()
    }
}

/// Result of a quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// The line now has this quantity.
    Updated(u32),
    /// A non-positive quantity removed the line.
    Removed,
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |count: u32, i| count.saturating_add(i.quantity))
    }

    /// Position of the line with `line_id`.
    #[must_use]
    pub fn position(&self, line_id: LineId) -> Option<usize> {
        self.items.iter().position(|i| i.line_id == line_id)
    }

    /// Look up a line.
    #[must_use]
    pub fn get(&self, line_id: LineId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.line_id == line_id)
    }

    /// Add from the catalog grid.
    ///
    /// A line without options merges into an existing line for the same
    /// product that also has no options; anything else is appended. Returns
    /// the id of the line that received the item. Merged quantities stop at
    /// [`MAX_QUANTITY`].
    pub fn add(&mut self, item: CartItem) -> LineId {
        if let Some(existing) = self.items.iter_mut().find(|line| line.merges_with(&item)) {
            existing.quantity = existing
                .quantity
                .saturating_add(item.quantity)
                .min(MAX_QUANTITY);
            return existing.line_id;
        }
        self.append(item)
    }

    /// Append a new line unconditionally (product detail page).
    pub fn append(&mut self, item: CartItem) -> LineId {
        let line_id = item.line_id;
        self.items.push(item);
        line_id
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if no line has `line_id`.
    pub fn remove(&mut self, line_id: LineId) -> Result<CartItem, CartError> {
        let index = self.position(line_id).ok_or(CartError::LineNotFound)?;
        self.remove_at(index)
    }

    /// Remove the line at `index`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if `index` is out of range.
    pub fn remove_at(&mut self, index: usize) -> Result<CartItem, CartError> {
        if index >= self.items.len() {
            return Err(CartError::LineNotFound);
        }
        Ok(self.items.remove(index))
    }

    /// Set a line's quantity.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CustomizedQuantity` (leaving the line unchanged)
    /// if the line carries options, or `CartError::LineNotFound`.
    pub fn set_quantity(&mut self, line_id: LineId, value: i64) -> Result<QuantityChange, CartError> {
        let index = self.position(line_id).ok_or(CartError::LineNotFound)?;
        self.set_quantity_at(index, value)
    }

    /// Set the quantity of the line at `index`. A non-positive value removes
    /// the line; anything above [`MAX_QUANTITY`] is clamped to it.
    ///
    /// # Errors
    ///
    /// Same as [`Cart::set_quantity`].
    pub fn set_quantity_at(&mut self, index: usize, value: i64) -> Result<QuantityChange, CartError> {
        let item = self.items.get_mut(index).ok_or(CartError::LineNotFound)?;
        if item.has_options() {
            return Err(CartError::CustomizedQuantity);
        }
        if value <= 0 {
            self.items.remove(index);
            return Ok(QuantityChange::Removed);
        }
        item.quantity = u32::try_from(value).map_or(MAX_QUANTITY, |q| q.min(MAX_QUANTITY));
        Ok(QuantityChange::Updated(item.quantity))
    }

    /// Change a line's color.
    ///
    /// # Errors
    ///
    /// Returns `CartError::EmptyColor` for a blank color,
    /// `CartError::UnknownColor` for a color the line's product does not
    /// offer, or `CartError::LineNotFound`.
    pub fn set_color(&mut self, line_id: LineId, color: &str) -> Result<(), CartError> {
        let index = self.position(line_id).ok_or(CartError::LineNotFound)?;
        self.set_color_at(index, color)
    }

    /// Change the color of the line at `index`.
    ///
    /// # Errors
    ///
    /// Same as [`Cart::set_color`].
    pub fn set_color_at(&mut self, index: usize, color: &str) -> Result<(), CartError> {
        let color = color.trim();
        if color.is_empty() {
            return Err(CartError::EmptyColor);
        }
        let item = self.items.get_mut(index).ok_or(CartError::LineNotFound)?;
        if !item.available_colors.iter().any(|c| c == color) {
            return Err(CartError::UnknownColor);
        }
        item.color = color.to_string();
        Ok(())
    }

    /// Sum of price × quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Upfront payment required for custom orders: half the total.
    #[must_use]
    pub fn deposit(&self) -> Price {
        self.total().half()
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

/// Parse a quantity typed into the cart form.
///
/// Reads the leading integer and ignores the rest (`"3 un"` is 3). Input
/// without a leading integer reads as 0, which removes the line. Integers
/// too large for `i64` saturate.
#[must_use]
pub fn parse_quantity(input: &str) -> i64 {
    let trimmed = input.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = digits.get(..end).unwrap_or_default();
    if digits.is_empty() {
        return 0;
    }
    match digits.parse::<i64>() {
        Ok(n) => sign * n,
        Err(_) if sign < 0 => i64::MIN,
        Err(_) => i64::MAX,
    }
}
