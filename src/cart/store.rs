//! The cart itself

use crate::cart::checkout::{checkout_url, order_summary, CheckoutConfig, CheckoutLink};
use crate::cart::line::{CartItemCandidate, CartLine, LineId};
use crate::cart::price::{format_amount, PriceStatus};
use crate::cart::visibility::CartVisibility;
use crate::error::{Result, StoreError};
use instant::Instant;
use log::debug;

/// Ordered collection of cart lines plus the drawer state
///
/// Lines are unique per (title, size) and never hold a zero quantity.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    visibility: CartVisibility,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cart with a custom drawer policy
    #[must_use]
    pub fn with_visibility(visibility: CartVisibility) -> Self {
        Self {
            lines: Vec::new(),
            visibility,
        }
    }

    /// Add one unit of a product
    ///
    /// A line with the same title and size gets its quantity bumped;
    /// otherwise a new line with quantity 1 is appended. Either way the
    /// cart pops open for a few seconds.
    pub fn add_item(&mut self, candidate: CartItemCandidate) -> LineId {
        self.add_item_at(candidate, Instant::now())
    }

    /// [`Cart::add_item`] with an explicit clock reading
    pub fn add_item_at(&mut self, candidate: CartItemCandidate, now: Instant) -> LineId {
        let size = candidate.size.as_deref();
        let id = match self
            .lines
            .iter_mut()
            .find(|line| line.matches(&candidate.title, size))
        {
            Some(line) => {
                line.quantity = line.quantity.saturating_add(1);
                debug!("Cart line {} now has quantity {}", line.title, line.quantity);
                line.id
            },
            None => {
                let line = CartLine::from_candidate(candidate);
                debug!("New cart line {} at {}", line.title, line.price);
                let id = line.id;
                self.lines.push(line);
                id
            },
        };

        self.visibility.show_temporarily(now);
        id
    }

    /// Set a line's quantity; anything below 1 removes the line
    ///
    /// Unknown ids are ignored.
    pub fn update_quantity(&mut self, id: LineId, quantity: i64) {
        if quantity < 1 {
            self.remove_item(id);
            return;
        }

        if let Some(line) = self.lines.iter_mut().find(|line| line.id == id) {
            line.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
    }

    /// Remove a line; unknown ids are ignored
    pub fn remove_item(&mut self, id: LineId) {
        let before = self.lines.len();
        self.lines.retain(|line| line.id != id);

        if before != self.lines.len() && self.lines.is_empty() {
            self.visibility.close_if_auto_showing();
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of line subtotals, finite and non-negative
    #[must_use]
    pub fn total_amount(&self) -> f64 {
        let total: f64 = self.lines.iter().map(CartLine::subtotal).sum();
        if total.is_finite() && total > 0.0 {
            total
        } else {
            0.0
        }
    }

    /// Total formatted with exactly two decimals
    #[must_use]
    pub fn total(&self) -> String {
        format_amount(self.total_amount())
    }

    /// Sum of quantities across lines
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|line| u64::from(line.quantity)).sum()
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn get(&self, id: LineId) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.id == id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether any line's price could not be read and counts as zero
    #[must_use]
    pub fn has_unpriced_lines(&self) -> bool {
        self.lines
            .iter()
            .any(|line| line.price_status == PriceStatus::Defaulted)
    }

    #[must_use]
    pub fn visibility(&self) -> &CartVisibility {
        &self.visibility
    }

    /// Open, close or flip the cart drawer
    pub fn toggle(&mut self, open: Option<bool>) {
        self.visibility.toggle(open);
    }

    /// Advance the drawer clock; returns `true` if the cart auto-closed
    pub fn tick(&mut self, now: Instant) -> bool {
        self.visibility.tick(now)
    }

    /// Build the checkout message and link, closing the drawer
    ///
    /// The cart contents are left untouched.
    pub fn begin_checkout(&mut self, config: &CheckoutConfig) -> Result<CheckoutLink> {
        if self.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        if self.has_unpriced_lines() {
            log::warn!("Checking out with lines whose price could not be read");
        }

        let message = order_summary(self, config);
        let url = checkout_url(&message, config);
        self.visibility.toggle(Some(false));

        Ok(CheckoutLink { message, url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_add_same_title_and_size_merges() {
        let mut cart = Cart::new();
        let first = cart.add_item(CartItemCandidate::new("Hoodie", 120.0).with_size("L"));
        let second = cart.add_item(CartItemCandidate::new("Hoodie", 120.0).with_size("L"));

        assert_eq!(first, second);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.get(first).unwrap().quantity, 2);
        assert_eq!(cart.total(), "240.00");
    }

    #[test]
    fn test_other_size_gets_its_own_line_and_is_untouched() {
        let mut cart = Cart::new();
        let small = cart.add_item(CartItemCandidate::new("Hoodie", 120.0).with_size("S"));
        let large = cart.add_item(CartItemCandidate::new("Hoodie", 120.0).with_size("L"));
        cart.add_item(CartItemCandidate::new("Hoodie", 120.0).with_size("L"));

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.get(small).unwrap().quantity, 1);
        assert_eq!(cart.get(large).unwrap().quantity, 2);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new();
        let id = cart.add_item(CartItemCandidate::new("Mug", "15"));

        cart.update_quantity(id, 4);
        assert_eq!(cart.get(id).unwrap().quantity, 4);
        assert_eq!(cart.total(), "60.00");

        cart.update_quantity(id, i64::MAX);
        assert_eq!(cart.get(id).unwrap().quantity, u32::MAX);

        cart.update_quantity(id, 0);
        assert!(cart.get(id).is_none());
        assert_eq!(cart.total(), "0.00");
    }

    #[test]
    fn test_negative_quantity_removes_line() {
        let mut cart = Cart::new();
        let id = cart.add_item(CartItemCandidate::new("Mug", "15"));
        cart.update_quantity(id, -2);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_unknown_ids_are_ignored() {
        let mut cart = Cart::new();
        cart.add_item(CartItemCandidate::new("Mug", "15"));
        cart.update_quantity(LineId::new(), 3);
        cart.remove_item(LineId::new());
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_unpriced_line_contributes_zero() {
        let mut cart = Cart::new();
        let priced = cart.add_item(CartItemCandidate::new("Poster", 10.0));
        cart.update_quantity(priced, 2);
        let unpriced = cart.add_item(CartItemCandidate::new("Custom", "abc"));
        cart.update_quantity(unpriced, 3);

        assert_eq!(cart.total(), "20.00");
        assert!(cart.has_unpriced_lines());
    }

    #[test]
    fn test_total_is_pure() {
        let mut cart = Cart::new();
        cart.add_item(CartItemCandidate::new("A", "0.1"));
        cart.add_item(CartItemCandidate::new("B", "0.2"));
        assert_eq!(cart.total(), cart.total());
        assert_eq!(cart.total(), "0.30");
    }

    #[test]
    fn test_add_shows_cart_temporarily() {
        let start = Instant::now();
        let mut cart = Cart::new();
        cart.add_item_at(CartItemCandidate::new("Pen", 3.0), start);
        assert!(cart.visibility().is_open());
        assert!(cart.visibility().is_auto_showing());

        assert!(cart.tick(start + Duration::from_secs(4)));
        assert!(!cart.visibility().is_open());
    }

    #[test]
    fn test_removing_last_line_closes_auto_shown_cart() {
        let mut cart = Cart::new();
        let id = cart.add_item(CartItemCandidate::new("Pen", 3.0));
        cart.remove_item(id);
        assert!(!cart.visibility().is_open());
    }

    #[test]
    fn test_removing_last_line_keeps_user_opened_cart() {
        let mut cart = Cart::new();
        let id = cart.add_item(CartItemCandidate::new("Pen", 3.0));
        cart.toggle(Some(true));
        cart.remove_item(id);
        assert!(cart.visibility().is_open());
    }

    #[test]
    fn test_clear_empties_lines() {
        let mut cart = Cart::new();
        cart.add_item(CartItemCandidate::new("Pen", 3.0));
        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_checkout_requires_items() {
        let mut cart = Cart::new();
        assert!(matches!(
            cart.begin_checkout(&CheckoutConfig::default()),
            Err(StoreError::EmptyCart)
        ));
    }

    #[test]
    fn test_checkout_closes_cart() {
        let mut cart = Cart::new();
        cart.add_item(CartItemCandidate::new("Pen", 3.0));
        let link = cart.begin_checkout(&CheckoutConfig::default()).unwrap();

        assert!(!cart.visibility().is_open());
        assert!(link.url.starts_with("https://wa.me/message/IUSOLSYPTTE6G1?text="));
        assert!(link.message.contains("Pen - 1 × 3 ر.س"));
        assert_eq!(cart.lines().len(), 1);
    }
}
