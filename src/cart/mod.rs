//! Shopping cart
//!
//! A plain owned value: callers create a [`Cart`], mutate it through
//! `&mut self` and read totals back. Nothing here performs I/O; the only
//! boundary is the checkout deep link.
//!
//! ```rust
//! use designs4u::cart::{Cart, CartItemCandidate, CheckoutConfig};
//!
//! let mut cart = Cart::new();
//! let id = cart.add_item(CartItemCandidate::new("تيشيرت", "٧٥ ر.س").with_size("L"));
//! cart.update_quantity(id, 2);
//! assert_eq!(cart.total(), "150.00");
//!
//! let link = cart.begin_checkout(&CheckoutConfig::default())?;
//! assert!(link.url.starts_with("https://wa.me/"));
//! # Ok::<(), designs4u::StoreError>(())
//! ```

pub mod checkout;
pub mod line;
pub mod price;
pub mod store;
pub mod visibility;

pub use checkout::{checkout_url, order_summary, CheckoutConfig, CheckoutLink};
pub use line::{CartItemCandidate, CartLine, LineId};
pub use price::{format_amount, parse_price, ParsedPrice, PriceInput, PriceStatus};
pub use store::Cart;
pub use visibility::{CartVisibility, AUTO_HIDE_AFTER};
