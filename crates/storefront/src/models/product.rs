//! Catalog product.

use rust_decimal::Decimal;
use serde::Deserialize;

use fantasia_core::{Price, ProductId};

use crate::backend::{BackendError, Document};

/// Collection holding the catalog.
pub const COLLECTION: &str = "produtos";

/// `tipo` value marking a made-to-order product.
pub const CUSTOM_ORDER_LABEL: &str = "Sob encomenda";

/// Image shown when a product has none.
pub const PLACEHOLDER_IMAGE: &str = "/static/img/placeholder.png";

/// Fulfillment type of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductKind {
    /// Ready to ship.
    #[default]
    Standard,
    /// Made to order; buyer supplies measurements and pays a deposit.
    CustomOrder,
}

impl ProductKind {
    /// Interpret the stored `tipo` label.
    #[must_use]
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(CUSTOM_ORDER_LABEL) => Self::CustomOrder,
            _ => Self::Standard,
        }
    }
}

/// A catalog product. Read-only from the storefront.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub description: String,
    /// Image URLs, first one is the cover.
    pub images: Vec<String>,
    pub category: Option<String>,
    pub kind: ProductKind,
    pub sizes: Vec<String>,
    pub colors: Vec<String>,
}

/// Stored shape of a product document.
#[derive(Debug, Deserialize)]
struct ProductDocument {
    #[serde(default)]
    nome: String,
    #[serde(default)]
    preco: Option<Decimal>,
    #[serde(default)]
    descricao: String,
    #[serde(default)]
    imagens: Vec<String>,
    #[serde(default)]
    categoria: Option<String>,
    #[serde(default)]
    tipo: Option<String>,
    #[serde(default)]
    tamanhos: Vec<String>,
    #[serde(default)]
    cores: Vec<String>,
}

impl Product {
    /// Decode a product from its document.
    ///
    /// Missing prices read as zero.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Malformed` if a field has the wrong type.
    pub fn from_document(document: &Document) -> Result<Self, BackendError> {
        let stored: ProductDocument = document.decode()?;
        Ok(Self {
            id: ProductId::new(document.id.clone()),
            name: stored.nome,
            price: Price::brl(stored.preco.unwrap_or_default()),
            description: stored.descricao,
            images: stored.imagens,
            category: stored.categoria,
            kind: ProductKind::from_label(stored.tipo.as_deref()),
            sizes: stored.tamanhos,
            colors: stored.cores,
        })
    }

    /// Cover image URL, or the placeholder.
    #[must_use]
    pub fn cover_image(&self) -> &str {
        self.images.first().map_or(PLACEHOLDER_IMAGE, String::as_str)
    }

    /// Whether the buyer must choose a color before adding to the cart.
    #[must_use]
    pub fn requires_color(&self) -> bool {
        !self.colors.is_empty()
    }

    /// Whether this is a made-to-order product.
    #[must_use]
    pub fn is_custom_order(&self) -> bool {
        self.kind == ProductKind::CustomOrder
    }

    /// Whether the grid must send the buyer to the detail page because a
    /// color or custom-order measurements have to be collected first.
    #[must_use]
    pub fn needs_details(&self) -> bool {
        self.requires_color() || self.is_custom_order()
    }

    /// Whether the product offers `color`.
    #[must_use]
    pub fn offers_color(&self, color: &str) -> bool {
        self.colors.iter().any(|c| c == color)
    }
}
