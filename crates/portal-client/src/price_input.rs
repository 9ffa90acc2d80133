//! Price text as typed into either UI.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Retail,
    Bulk,
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceField::Retail => write!(f, "Retail"),
            PriceField::Bulk => write!(f, "Bulk"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{text:?} is not a valid price")]
pub struct InvalidPrice {
    pub text: String,
}

/// Blank (after trimming) means "no price"; otherwise the text must be a
/// finite decimal number, plain or in scientific notation.
///
/// # Errors
///
/// Returns [`InvalidPrice`] for any other non-blank text.
pub fn parse_price_input(text: &str) -> Result<Option<Decimal>, InvalidPrice> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(Some)
        .map_err(|_| InvalidPrice {
            text: text.to_owned(),
        })
}

/// Text placed in an input box for a stored price. Trailing zeros are
/// dropped, so `9.90` shows as `9.9`.
#[must_use]
pub fn format_price_input(price: Option<Decimal>) -> String {
    price.map(|p| p.normalize().to_string()).unwrap_or_default()
}
