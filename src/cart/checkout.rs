//! Checkout handoff
//!
//! The cart is serialized into a plain-text order and attached to a
//! messaging deep link; the order itself is completed by a human on the
//! other end.

use crate::cart::store::Cart;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Deep link the storefront hands orders to
pub const DEFAULT_DEEP_LINK: &str = "https://wa.me/message/IUSOLSYPTTE6G1";

/// Saudi riyal label appended to amounts
pub const DEFAULT_CURRENCY_LABEL: &str = "ر.س";

/// Wording and target of the checkout message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutConfig {
    pub deep_link_base: String,
    pub currency_label: String,
    /// First line of the message
    pub header: String,
    /// Label in front of the total
    pub total_label: String,
    /// Write ` (size)` after the title of sized lines
    #[serde(default = "default_show_sizes")]
    pub show_sizes: bool,
}

fn default_show_sizes() -> bool {
    true
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            deep_link_base: DEFAULT_DEEP_LINK.to_string(),
            currency_label: DEFAULT_CURRENCY_LABEL.to_string(),
            header: "الطلبية:".to_string(),
            total_label: "الإجمالي:".to_string(),
            show_sizes: default_show_sizes(),
        }
    }
}

impl CheckoutConfig {
    #[must_use]
    pub fn with_deep_link<S: Into<String>>(mut self, deep_link_base: S) -> Self {
        self.deep_link_base = deep_link_base.into();
        self
    }

    #[must_use]
    pub fn with_currency_label<S: Into<String>>(mut self, currency_label: S) -> Self {
        self.currency_label = currency_label.into();
        self
    }

    /// Drop the size annotation, giving `title - quantity × price currency`
    #[must_use]
    pub fn with_sizes(mut self, show_sizes: bool) -> Self {
        self.show_sizes = show_sizes;
        self
    }
}

/// Order message plus the link that carries it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLink {
    pub message: String,
    pub url: String,
}

/// Plain-text order summary
///
/// One line per cart line (`title (size) - quantity × price currency`),
/// a blank line, then the total. The size is left out for unsized lines
/// and when [`CheckoutConfig::show_sizes`] is off.
#[must_use]
pub fn order_summary(cart: &Cart, config: &CheckoutConfig) -> String {
    let mut message = String::new();
    let _ = writeln!(message, "{}", config.header);

    for line in cart.lines() {
        let _ = write!(message, "{}", line.title);
        let size = line.size.as_deref().filter(|s| config.show_sizes && !s.is_empty());
        if let Some(size) = size {
            let _ = write!(message, " ({})", size);
        }
        let _ = writeln!(
            message,
            " - {} × {} {}",
            line.quantity, line.price, config.currency_label
        );
    }

    let _ = write!(
        message,
        "\n{} {} {}",
        config.total_label,
        cart.total(),
        config.currency_label
    );
    message
}

/// Deep link with `message` percent-encoded into the `text` query parameter
#[must_use]
pub fn checkout_url(message: &str, config: &CheckoutConfig) -> String {
    format!(
        "{}?text={}",
        config.deep_link_base,
        urlencoding::encode(message)
    )
}
