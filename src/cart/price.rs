//! Price normalization
//!
//! Catalog prices arrive either as numbers or as free text typed into the
//! admin dashboard, often with Arabic-Indic digits and a currency label
//! ("١٢٫٥٠ ر.س", "SAR 99", "1,250"). Text is reduced to a single decimal
//! number; anything that still fails to parse counts as zero and is
//! flagged so callers can tell a free item from an unpriced one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Raw price as stored on a product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Amount(f64),
    Text(String),
}

impl From<f64> for PriceInput {
    fn from(amount: f64) -> Self {
        Self::Amount(amount)
    }
}

impl From<&str> for PriceInput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for PriceInput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl fmt::Display for PriceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amount(amount) => write!(f, "{}", amount),
            Self::Text(text) => f.write_str(text.trim()),
        }
    }
}

/// How a numeric price was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceStatus {
    /// Supplied as a number
    Numeric,
    /// Extracted from text
    Parsed,
    /// Could not be read; counted as zero
    Defaulted,
}

/// Result of [`parse_price`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedPrice {
    /// Price as shown to the customer
    pub display: String,
    /// Finite, non-negative amount used for totals
    pub numeric: f64,
    pub status: PriceStatus,
}

fn normalize_char(c: char) -> char {
    match c {
        '\u{0660}'..='\u{0669}' => char::from(b'0' + (c as u32 - 0x0660) as u8),
        '\u{06F0}'..='\u{06F9}' => char::from(b'0' + (c as u32 - 0x06F0) as u8),
        '\u{066B}' => '.',
        '\u{066C}' => ',',
        other => other,
    }
}

/// First run of digits, commas and dots that contains at least one digit
fn numeric_run(text: &str) -> Option<String> {
    let mut current = String::new();
    for c in text.chars().map(normalize_char) {
        if c.is_ascii_digit() || c == ',' || c == '.' {
            current.push(c);
            continue;
        }
        if current.chars().any(|c| c.is_ascii_digit()) {
            return Some(current);
        }
        current.clear();
    }
    current
        .chars()
        .any(|c| c.is_ascii_digit())
        .then_some(current)
}

/// Turn commas into dots and keep only the last dot as the decimal point
fn collapse_separators(run: &str) -> String {
    let unified = run.replace(',', ".");
    match unified.rfind('.') {
        Some(last) => {
            let (integer, fraction) = unified.split_at(last);
            format!("{}{}", integer.replace('.', ""), fraction)
        },
        None => unified,
    }
}

fn parse_text(text: &str) -> Option<f64> {
    let run = numeric_run(text)?;
    let candidate = collapse_separators(&run);
    let trimmed = candidate.trim_end_matches('.');
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Normalize a raw price into a display string and a numeric amount
///
/// ```rust
/// use designs4u::cart::{parse_price, PriceInput, PriceStatus};
///
/// let parsed = parse_price(&PriceInput::from("١٢٫٥٠ ر.س"));
/// assert_eq!(parsed.numeric, 12.5);
/// assert_eq!(parsed.status, PriceStatus::Parsed);
///
/// let unpriced = parse_price(&PriceInput::from("call us"));
/// assert_eq!(unpriced.numeric, 0.0);
/// assert_eq!(unpriced.status, PriceStatus::Defaulted);
/// ```
#[must_use]
pub fn parse_price(input: &PriceInput) -> ParsedPrice {
    match input {
        PriceInput::Amount(amount) if amount.is_finite() => ParsedPrice {
            display: amount.to_string(),
            numeric: *amount,
            status: PriceStatus::Numeric,
        },
        PriceInput::Amount(amount) => {
            log::warn!("Price {} is not a usable amount, counting it as 0", amount);
            ParsedPrice {
                display: amount.to_string(),
                numeric: 0.0,
                status: PriceStatus::Defaulted,
            }
        },
        PriceInput::Text(text) => {
            let display = match text.trim() {
                "" => "0".to_string(),
                trimmed => trimmed.to_string(),
            };
            match parse_text(text) {
                Some(numeric) => ParsedPrice {
                    display,
                    numeric,
                    status: PriceStatus::Parsed,
                },
                None => {
                    log::warn!("Could not read a price from {:?}, counting it as 0", text);
                    ParsedPrice {
                        display,
                        numeric: 0.0,
                        status: PriceStatus::Defaulted,
                    }
                },
            }
        },
    }
}

/// Format an amount with two decimals
#[must_use]
pub fn format_amount(amount: f64) -> String {
    format!("{amount:.2}")
}
