//! Cart behavior as seen by a storefront session
//!
//! Adding products from listings, editing quantities in the drawer, the
//! auto-hide timer and the checkout hand-off.

use designs4u::cart::{
    parse_price, Cart, CartItemCandidate, CheckoutConfig, PriceInput, PriceStatus,
    AUTO_HIDE_AFTER,
};
use designs4u::StoreError;
use instant::Instant;
use std::time::Duration;

fn abaya(size: &str) -> CartItemCandidate {
    CartItemCandidate::new("عباية سوداء", "٢٥٠")
        .with_size(size)
        .with_image_url("https://cdn.example.com/abaya.webp")
        .with_product_id("p-17")
}

#[test]
fn test_repeat_adds_merge_by_title_and_size() {
    let mut cart = Cart::new();
    let m = cart.add_item(abaya("M"));
    let again = cart.add_item(abaya("M"));
    let l = cart.add_item(abaya("L"));
    cart.add_item(CartItemCandidate::new("Logo design", 99.0));

    assert_eq!(m, again);
    assert_ne!(m, l);
    assert_eq!(cart.lines().len(), 3);
    assert_eq!(cart.get(m).map(|line| line.quantity), Some(2));
    assert_eq!(cart.get(l).map(|line| line.quantity), Some(1));
    assert_eq!(cart.item_count(), 4);
    assert_eq!(cart.total(), "849.00");
}

#[test]
fn test_merge_only_touches_the_matching_line() {
    let mut cart = Cart::new();
    let plain = cart.add_item(CartItemCandidate::new("Mug", 20.0));
    let sized = cart.add_item(CartItemCandidate::new("Mug", 20.0).with_size("XL"));
    cart.add_item(CartItemCandidate::new("Mug", 20.0).with_size("XL"));

    assert_eq!(cart.get(plain).map(|line| line.quantity), Some(1));
    assert_eq!(cart.get(sized).map(|line| line.quantity), Some(2));
}

#[test]
fn test_quantity_below_one_removes_the_line() {
    let mut cart = Cart::new();
    let keep = cart.add_item(CartItemCandidate::new("Poster", 15.0));
    let drop = cart.add_item(CartItemCandidate::new("Sticker", 2.5));

    cart.update_quantity(keep, 4);
    cart.update_quantity(drop, 0);
    assert_eq!(cart.lines().len(), 1);
    assert_eq!(cart.total(), "60.00");

    cart.update_quantity(keep, -3);
    assert!(cart.is_empty());
    assert_eq!(cart.total(), "0.00");
}

#[test]
fn test_unreadable_price_counts_as_zero() {
    let mut cart = Cart::new();
    cart.add_item(CartItemCandidate::new("Business cards", 20.0));
    let custom = cart.add_item(CartItemCandidate::new("Custom order", "حسب الطلب"));

    assert_eq!(cart.total(), "20.00");
    assert!(cart.has_unpriced_lines());

    let line = cart.get(custom).expect("line exists");
    assert_eq!(line.price_status, PriceStatus::Defaulted);
    assert_eq!(line.price, "حسب الطلب");
}

#[test]
fn test_unparseable_line_never_poisons_the_total() {
    let mut cart = Cart::new();
    let priced = cart.add_item(CartItemCandidate::new("A", "10"));
    let broken = cart.add_item(CartItemCandidate::new("C", "abc"));
    cart.update_quantity(priced, 2);
    cart.update_quantity(broken, 3);

    assert_eq!(cart.total(), "20.00");
    assert!(cart.total_amount().is_finite());
}

#[test]
fn test_negative_amount_offsets_other_lines() {
    let mut cart = Cart::new();
    cart.add_item(CartItemCandidate::new("Discount", -5.0));
    cart.add_item(CartItemCandidate::new("Mug", 10.0));
    assert_eq!(cart.total(), "5.00");
    assert!(!cart.has_unpriced_lines());

    // Only the sum is floored at zero.
    cart.add_item(CartItemCandidate::new("Voucher", -50.0));
    assert_eq!(cart.total(), "0.00");
}

#[test]
fn test_arabic_decimal_separator() {
    let mut cart = Cart::new();
    let id = cart.add_item(CartItemCandidate::new("B", "١٢٫٥٠"));
    let line = cart.get(id).expect("line exists");
    assert_eq!(line.numeric_price, 12.5);
    assert_eq!(line.price_status, PriceStatus::Parsed);
}

#[test]
fn test_price_text_variants() {
    let cases: [(&str, f64); 6] = [
        ("١٢٫٥٠ ر.س", 12.5),
        ("۳۵۰", 350.0),
        ("SAR 99", 99.0),
        ("99.90 SAR", 99.9),
        ("from 45 to 60", 45.0),
        ("12,5", 12.5),
    ];

    for (text, expected) in cases {
        let parsed = parse_price(&PriceInput::from(text));
        assert_eq!(parsed.numeric, expected, "price text {text:?}");
        assert_eq!(parsed.status, PriceStatus::Parsed);
        assert_eq!(parsed.display, text);
    }

    assert_eq!(parse_price(&PriceInput::from("  ")).display, "0");
    assert_eq!(
        parse_price(&PriceInput::Amount(f64::NAN)).status,
        PriceStatus::Defaulted
    );
}

#[test]
fn test_checkout_message_and_link() -> designs4u::Result<()> {
    let mut cart = Cart::new();
    cart.add_item(abaya("M"));
    cart.add_item(abaya("M"));
    cart.add_item(CartItemCandidate::new("Logo design", 99.5));

    let link = cart.begin_checkout(&CheckoutConfig::default())?;
    assert_eq!(
        link.message,
        "الطلبية:\nعباية سوداء (M) - 2 × ٢٥٠ ر.س\nLogo design - 1 × 99.5 ر.س\n\nالإجمالي: 599.50 ر.س"
    );
    assert!(link.url.starts_with("https://wa.me/message/IUSOLSYPTTE6G1?text="));
    assert!(!link.url.contains(' '));
    assert!(link.url.contains("599.50"));

    // Lines stay in place so the customer can come back and edit.
    assert_eq!(cart.lines().len(), 2);
    assert!(!cart.visibility().is_open());
    Ok(())
}

#[test]
fn test_custom_deep_link_and_currency() -> designs4u::Result<()> {
    let mut cart = Cart::new();
    cart.add_item(CartItemCandidate::new("Flyer", 10.0));

    let config = CheckoutConfig::default()
        .with_deep_link("https://wa.me/966500000000")
        .with_currency_label("SAR");
    let link = cart.begin_checkout(&config)?;

    assert!(link.message.ends_with("10.00 SAR"));
    assert!(link.url.starts_with("https://wa.me/966500000000?text="));
    Ok(())
}

#[test]
fn test_empty_cart_cannot_check_out() {
    let mut cart = Cart::new();
    let err = cart
        .begin_checkout(&CheckoutConfig::default())
        .unwrap_err();
    assert!(matches!(err, StoreError::EmptyCart));
}

#[test]
fn test_drawer_auto_hides_after_add() {
    let mut cart = Cart::new();
    let start = Instant::now();
    cart.add_item_at(CartItemCandidate::new("Flyer", 10.0), start);

    assert!(cart.visibility().is_open());
    assert!(!cart.tick(start + AUTO_HIDE_AFTER - Duration::from_millis(1)));
    assert!(cart.visibility().is_open());

    assert!(cart.tick(start + AUTO_HIDE_AFTER));
    assert!(!cart.visibility().is_open());
}

#[test]
fn test_opening_the_drawer_cancels_auto_hide() {
    let mut cart = Cart::new();
    let start = Instant::now();
    cart.add_item_at(CartItemCandidate::new("Flyer", 10.0), start);

    cart.toggle(Some(true));
    assert!(!cart.tick(start + AUTO_HIDE_AFTER * 2));
    assert!(cart.visibility().is_open());
}

#[test]
fn test_second_add_extends_the_deadline() {
    let mut cart = Cart::new();
    let start = Instant::now();
    cart.add_item_at(CartItemCandidate::new("Flyer", 10.0), start);
    let later = start + Duration::from_secs(3);
    cart.add_item_at(CartItemCandidate::new("Flyer", 10.0), later);

    assert!(!cart.tick(start + AUTO_HIDE_AFTER));
    assert!(cart.tick(later + AUTO_HIDE_AFTER));
}
