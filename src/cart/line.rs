//! Cart lines and the candidates they are built from

use crate::cart::price::{parse_price, PriceInput, PriceStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque identifier of a cart line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId(Uuid);

impl LineId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LineId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Product the customer asked to add
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemCandidate {
    pub title: String,
    pub price: PriceInput,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub product_id: Option<String>,
}

impl CartItemCandidate {
    #[must_use]
    pub fn new<T: Into<String>, P: Into<PriceInput>>(title: T, price: P) -> Self {
        Self {
            title: title.into(),
            price: price.into(),
            size: None,
            image_url: None,
            product_id: None,
        }
    }

    #[must_use]
    pub fn with_size<S: Into<String>>(mut self, size: S) -> Self {
        self.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn with_image_url<S: Into<String>>(mut self, image_url: S) -> Self {
        self.image_url = Some(image_url.into());
        self
    }

    #[must_use]
    pub fn with_product_id<S: Into<String>>(mut self, product_id: S) -> Self {
        self.product_id = Some(product_id.into());
        self
    }
}

/// One distinct (title, size) entry in the cart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub id: LineId,
    pub title: String,
    /// Price as shown to the customer
    pub price: String,
    pub numeric_price: f64,
    pub price_status: PriceStatus,
    /// Always at least 1
    pub quantity: u32,
    pub image_url: Option<String>,
    pub product_id: Option<String>,
    pub size: Option<String>,
}

impl CartLine {
    /// New line with quantity 1
    #[must_use]
    pub fn from_candidate(candidate: CartItemCandidate) -> Self {
        let parsed = parse_price(&candidate.price);
        Self {
            id: LineId::new(),
            title: candidate.title,
            price: parsed.display,
            numeric_price: parsed.numeric,
            price_status: parsed.status,
            quantity: 1,
            image_url: candidate.image_url,
            product_id: candidate.product_id,
            size: candidate.size,
        }
    }

    /// Whether this line is the one a candidate with `title` and `size` merges into
    #[must_use]
    pub fn matches(&self, title: &str, size: Option<&str>) -> bool {
        self.title == title && self.size.as_deref() == size
    }

    /// `numeric_price * quantity`, or 0 when that is not a finite number
    #[must_use]
    pub fn subtotal(&self) -> f64 {
        let subtotal = self.numeric_price * f64::from(self.quantity);
        if subtotal.is_finite() {
            subtotal
        } else {
            0.0
        }
    }
}
