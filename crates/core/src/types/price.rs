//! Type-safe price representation using decimal arithmetic.
//!
//! WooCommerce reports prices as decimal strings. REST responses carry bare
//! amounts (`"19.99"`); WooGraphQL can return formatted strings with the
//! currency symbol, HTML entities, and ranges for variable products.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors from parsing prices or currency codes.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PriceError {
    /// The amount could not be parsed as a decimal.
    #[error("invalid price amount: {0}")]
    InvalidAmount(String),
    /// The currency code is not supported.
    #[error("unsupported currency code: {0}")]
    UnsupportedCurrency(String),
}

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Parse a price string as emitted by WooCommerce.
    ///
    /// Returns `Ok(None)` for empty input (WooCommerce uses `""` for "no sale
    /// price"). Ranges like `"10.00 - 20.00"` parse to the lower bound.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::InvalidAmount` if the remaining text is not a
    /// decimal number.
    pub fn parse(raw: &str, currency_code: CurrencyCode) -> Result<Option<Self>, PriceError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }

        // Lower bound of a range ("10.00 - 20.00" or "10.00, 20.00")
        let first = trimmed
            .split(" - ")
            .next()
            .and_then(|s| s.split(", ").next())
            .unwrap_or(trimmed);

        let cleaned: String = strip_entities(first)
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
            .collect();

        if cleaned.is_empty() {
            return Err(PriceError::InvalidAmount(raw.to_string()));
        }

        let amount = Decimal::from_str(&cleaned)
            .map_err(|_| PriceError::InvalidAmount(raw.to_string()))?;

        Ok(Some(Self::new(amount, currency_code)))
    }

    /// Multiply by a quantity.
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Add two prices of the same currency.
    #[must_use]
    pub fn plus(&self, other: &Self) -> Self {
        Self::new(self.amount + other.amount, self.currency_code)
    }

    /// Subtract, never going below zero.
    #[must_use]
    pub fn saturating_sub(&self, other: &Self) -> Self {
        let amount = (self.amount - other.amount).max(Decimal::ZERO);
        Self::new(amount, self.currency_code)
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Format for display (e.g., "$19.99").
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        format!("{}{rounded:.2}", self.currency_code.symbol())
    }
}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Remove HTML entities WooGraphQL uses for currency symbols (`&#36;`, `&pound;`).
fn strip_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match tail.find(';') {
            Some(end) if end <= 10 => rest = &tail[end + 1..],
            _ => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    // Thousands separators
    out.replace(',', "")
}

/// ISO 4217 currency codes supported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    EUR,
    GBP,
    CAD,
    AUD,
}

impl CurrencyCode {
    /// Display symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// ISO code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
        }
    }
}

impl FromStr for CurrencyCode {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            "CAD" => Ok(Self::CAD),
            "AUD" => Ok(Self::AUD),
            other => Err(PriceError::UnsupportedCurrency(other.to_string())),
        }
    }
}
