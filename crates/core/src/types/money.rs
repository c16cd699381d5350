//! Type-safe money representation using decimal arithmetic.
//!
//! Shopify returns amounts as decimal strings (`"19.99"`) next to an ISO 4217
//! currency code. [`Money`] parses those once at the API boundary so templates
//! never format floats.

use core::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Money`] value.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// The amount is not a decimal number.
    #[error("invalid amount '{0}'")]
    InvalidAmount(String),
    /// The currency code is not three ASCII letters.
    #[error("invalid currency code '{0}'")]
    InvalidCurrency(String),
}

/// A monetary amount with currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    /// Amount in the currency's standard unit (e.g., dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code, uppercase.
    pub currency_code: String,
}

impl Money {
    /// Create a new money value.
    #[must_use]
    pub fn new(amount: Decimal, currency_code: impl Into<String>) -> Self {
        Self {
            amount,
            currency_code: currency_code.into(),
        }
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub fn zero(currency_code: impl Into<String>) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Parse the `{amount, currencyCode}` string pair returned by Shopify.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a decimal or the currency code is
    /// not three ASCII letters.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| MoneyError::InvalidAmount(amount.to_string()))?;

        if currency_code.len() != 3 || !currency_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(MoneyError::InvalidCurrency(currency_code.to_string()));
        }

        Ok(Self::new(amount, currency_code.to_ascii_uppercase()))
    }

    /// Whether the amount is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Multiply by a quantity (line totals).
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code.clone())
    }

    /// Display symbol for the currency, falling back to the code.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self.currency_code.as_str() {
            "USD" | "CAD" | "AUD" | "NZD" => "$",
            "EUR" => "€",
            "GBP" => "£",
            "JPY" => "¥",
            other => other,
        }
    }

    /// Format for display (e.g., `$19.99`, `€5.00`, `CHF 12.50`).
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let symbol = self.symbol();
        if symbol == self.currency_code {
            format!("{symbol} {rounded:.2}")
        } else {
            format!("{symbol}{rounded:.2}")
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}
