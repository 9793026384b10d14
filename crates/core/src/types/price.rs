//! Type-safe price representation using decimal arithmetic.

use core::fmt;
use core::iter::Sum;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A price with currency information.
///
/// Catalog documents store prices as plain numbers; the storefront sells in
/// a single currency, so `currency_code` defaults to BRL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (reais, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    #[serde(default)]
    pub currency_code: CurrencyCode,
}

impl Price {
    /// A zero price in the default currency.
    pub const ZERO: Self = Self::new(Decimal::ZERO, CurrencyCode::BRL);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the default currency.
    #[must_use]
    pub const fn brl(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::BRL)
    }

    /// Price of `quantity` units.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Half of this price, rounded to centavos.
    ///
    /// Used for the upfront deposit required on custom orders.
    #[must_use]
    pub fn half(self) -> Self {
        Self::new((self.amount / Decimal::TWO).round_dp(2), self.currency_code)
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for Price {
    /// Formats as `R$ 12.50`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2}",
            self.currency_code.symbol(),
            self.amount.round_dp(2)
        )
    }
}

impl core::ops::Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.amount + rhs.amount, self.currency_code)
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, p| acc + p)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Display symbol for the currency.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::BRL => "R$",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brl(cents: i64) -> Price {
        Price::brl(Decimal::new(cents, 2))
    }

    #[test]
    fn test_display_pads_to_two_places() {
        assert_eq!(Price::brl(Decimal::from(80)).to_string(), "R$ 80.00");
        assert_eq!(brl(1995).to_string(), "R$ 19.95");
    }

    #[test]
    fn test_times_multiplies_amount() {
        assert_eq!(brl(1250).times(3), brl(3750));
        assert_eq!(brl(1250).times(0), Price::ZERO);
    }

    #[test]
    fn test_half_rounds_to_centavos() {
        assert_eq!(brl(10001).half(), brl(5000));
        assert_eq!(brl(9000).half(), brl(4500));
    }

    #[test]
    fn test_sum_of_empty_is_zero() {
        let total: Price = Vec::<Price>::new().into_iter().sum();
        assert!(total.is_zero());
    }

    #[test]
    fn test_sum_adds_amounts() {
        let total: Price = [brl(100), brl(250)].into_iter().sum();
        assert_eq!(total, brl(350));
    }
}
