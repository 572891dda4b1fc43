//! Message texts
//!
//! Money strings come preformatted from the backend and are inserted as-is.

use super::CatalogPage;
use crate::commerce::{Cart, CartItem, Product};
use std::borrow::Cow;
use std::fmt::Write;

pub const STALE_BUTTON: &str = "This button is no longer active.";
pub const USE_BUTTONS: &str = "Please use the buttons below, or send /start to begin again.";
pub const FAILURE_NOTICE: &str =
    "Something went wrong on our side. Please try again, or send /start to begin again.";

/// Telegram's cap on photo captions, in UTF-16 code units
const PHOTO_CAPTION_LIMIT: usize = 1024;

pub fn added_to_cart(quantity: u32) -> String {
    format!("Added {quantity} pcs")
}

pub fn catalog_caption(page: &CatalogPage) -> String {
    if page.products().is_empty() {
        return "The catalog is empty right now.".to_string();
    }
    if page.page_count() == 1 {
        return "Choose a product".to_string();
    }
    format!(
        "Choose a product (page {} of {})",
        page.index() + 1,
        page.page_count()
    )
}

pub fn product_caption(product: &Product, in_cart: Option<&CartItem>) -> String {
    let mut caption = format!(
        "{}\n\n{} per unit ({} kg)\n{} units in stock",
        product.name, product.display_price, product.weight_kg, product.stock_level
    );
    if let Some(line) = in_cart {
        let _ = write!(
            caption,
            "\n{} pcs in cart for {}",
            line.quantity, line.line_total
        );
    }
    if !product.description.is_empty() {
        let _ = write!(caption, "\n\n{}", product.description);
    }
    caption
}

fn cart_line(item: &CartItem) -> String {
    let mut line = item.name.clone();
    if !item.description.is_empty() {
        line.push('\n');
        line.push_str(&item.description);
    }
    let _ = write!(
        line,
        "\n{} per unit\n{} pcs in cart for {}",
        item.unit_price, item.quantity, item.line_total
    );
    line
}

pub fn cart_summary(cart: &Cart) -> String {
    if cart.items.is_empty() {
        return format!("Your cart is empty.\n\nTotal: {}", cart.total);
    }
    let lines: Vec<String> = cart.items.iter().map(cart_line).collect();
    format!("{}\n\nTotal: {}", lines.join("\n\n"), cart.total)
}

pub fn email_prompt(retry: bool) -> &'static str {
    if retry {
        "That email was not accepted. Please send it again, for example: example@gmail.com"
    } else {
        "Please send your email so we can contact you about the order."
    }
}

pub fn order_confirmation(email: &str, cart: &Cart) -> String {
    format!(
        "You sent us this email: {email}\nThank you, we will contact you soon!\n\nYour order:\n{}",
        cart_summary(cart)
    )
}

/// Cut a caption down to what Telegram accepts under a photo
pub fn photo_caption(caption: &str) -> Cow<'_, str> {
    if caption.encode_utf16().count() <= PHOTO_CAPTION_LIMIT {
        return Cow::Borrowed(caption);
    }

    // One unit stays reserved for the ellipsis
    let mut used = 1;
    let end = caption
        .char_indices()
        .find_map(|(i, c)| {
            used += c.len_utf16();
            (used > PHOTO_CAPTION_LIMIT).then_some(i)
        })
        .unwrap_or(caption.len());
    Cow::Owned(format!("{}\u{2026}", caption[..end].trim_end()))
}
