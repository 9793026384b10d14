//! Product option validation before adding to the cart.

use thiserror::Error;

use crate::models::{CartItem, Product};

/// Reasons an add-to-cart submission is refused.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OptionError {
    /// The product declares colors and none was chosen.
    #[error("Selecione uma cor antes de adicionar ao carrinho.")]
    ColorRequired,

    /// The chosen color is not one the product offers.
    #[error("Cor indisponível para este produto.")]
    UnknownColor,

    /// Custom orders need the buyer's measurements.
    #[error("Coloque aqui suas medidas.")]
    ObservationRequired,
}

/// Options submitted from the product detail form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionSelection {
    pub color: Option<String>,
    pub observation: Option<String>,
}

/// Build the cart line for a product detail submission.
///
/// A product with colors requires one of them to be chosen; a custom-order
/// product requires a non-blank observation, kept verbatim apart from
/// surrounding whitespace. The line snapshots the cover image and the
/// product's colors so the color can be changed later from the cart.
///
/// # Errors
///
/// Returns the first [`OptionError`] the selection violates.
pub fn validate_options(
    product: &Product,
    selection: &OptionSelection,
) -> Result<CartItem, OptionError> {
    let color = if product.requires_color() {
        let chosen = selection
            .color
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(OptionError::ColorRequired)?;
        if !product.offers_color(chosen) {
            return Err(OptionError::UnknownColor);
        }
        chosen.to_string()
    } else {
        String::new()
    };

    let observation = if product.is_custom_order() {
        selection
            .observation
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .ok_or(OptionError::ObservationRequired)?
            .to_string()
    } else {
        String::new()
    };

    let mut item = base_item(product);
    item.color = color;
    item.observation = observation;
    Ok(item)
}

/// Build the cart line for a direct add from the catalog grid.
///
/// # Errors
///
/// Returns `OptionError::ColorRequired` for products with colors and
/// `OptionError::ObservationRequired` for custom orders; both need the
/// detail page.
pub fn catalog_item(product: &Product) -> Result<CartItem, OptionError> {
    if product.requires_color() {
        return Err(OptionError::ColorRequired);
    }
    if product.is_custom_order() {
        return Err(OptionError::ObservationRequired);
    }
    Ok(base_item(product))
}

fn base_item(product: &Product) -> CartItem {
    let mut item = CartItem::new(product.id.clone(), product.name.clone(), product.price.amount);
    item.is_encomenda = product.is_custom_order();
    item.image_url = Some(product.cover_image().to_string());
    item.available_colors.clone_from(&product.colors);
    item
}
