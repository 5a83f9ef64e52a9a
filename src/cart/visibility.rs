//! Open/closed state of the cart drawer
//!
//! Adding an item pops the cart open for a few seconds. The caller drives
//! time by calling [`CartVisibility::tick`]; no timers run in the
//! background.

use instant::Instant;
use std::time::Duration;

/// How long an automatically shown cart stays open
pub const AUTO_HIDE_AFTER: Duration = Duration::from_secs(4);

/// Visibility of the cart drawer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartVisibility {
    open: bool,
    auto_showing: bool,
    hide_at: Option<Instant>,
    auto_hide_after: Duration,
}

impl Default for CartVisibility {
    fn default() -> Self {
        Self::new(AUTO_HIDE_AFTER)
    }
}

impl CartVisibility {
    #[must_use]
    pub fn new(auto_hide_after: Duration) -> Self {
        Self {
            open: false,
            auto_showing: false,
            hide_at: None,
            auto_hide_after,
        }
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Whether the cart is open only because an item was just added
    #[must_use]
    pub fn is_auto_showing(&self) -> bool {
        self.auto_showing
    }

    /// When an auto-shown cart will close, if armed
    #[must_use]
    pub fn hide_deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    /// Open the cart and arm the auto-hide deadline
    ///
    /// A later call re-arms the deadline from `now`.
    pub fn show_temporarily(&mut self, now: Instant) {
        self.open = true;
        self.auto_showing = true;
        self.hide_at = Some(now + self.auto_hide_after);
    }

    /// Open, close or flip the cart
    ///
    /// An explicit open belongs to the customer, so it disarms any pending
    /// auto-hide. Closing always clears the auto-showing flag.
    pub fn toggle(&mut self, open: Option<bool>) {
        let target = open.unwrap_or(!self.open);
        self.open = target;
        if !target || open.is_some() {
            self.auto_showing = false;
            self.hide_at = None;
        }
    }

    /// Close an auto-shown cart once its deadline has passed
    ///
    /// Returns `true` when this call closed the cart.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if self.auto_showing && now >= deadline => {
                self.open = false;
                self.auto_showing = false;
                self.hide_at = None;
                true
            },
            _ => false,
        }
    }

    /// Close the cart if it is only open because of an auto-show
    pub fn close_if_auto_showing(&mut self) {
        if self.auto_showing {
            self.toggle(Some(false));
        }
    }
}
