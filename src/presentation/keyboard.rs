//! Inline keyboards and the callback payloads their buttons carry

use super::CatalogPage;
use crate::commerce::{Cart, Product};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// What a button asks for when pressed
///
/// Encoded into the transport's callback payload with `Display` and decoded
/// with `FromStr`. Ids never contain `:` except possibly the product id of
/// `AddToCart`, which is why its quantity is split off from the right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Page(usize),
    Product(String),
    AddToCart { product_id: String, quantity: u32 },
    Remove(String),
    Cart,
    Back,
    Menu,
    Pay,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognised button payload {0:?}")]
pub struct InvalidCallback(pub String);

impl fmt::Display for CallbackAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackAction::Page(page) => write!(f, "page:{page}"),
            CallbackAction::Product(id) => write!(f, "product:{id}"),
            CallbackAction::AddToCart {
                product_id,
                quantity,
            } => write!(f, "add:{product_id}:{quantity}"),
            CallbackAction::Remove(id) => write!(f, "remove:{id}"),
            CallbackAction::Cart => f.write_str("cart"),
            CallbackAction::Back => f.write_str("back"),
            CallbackAction::Menu => f.write_str("menu"),
            CallbackAction::Pay => f.write_str("pay"),
        }
    }
}

impl FromStr for CallbackAction {
    type Err = InvalidCallback;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidCallback(s.to_string());

        match s {
            "cart" => return Ok(CallbackAction::Cart),
            "back" => return Ok(CallbackAction::Back),
            "menu" => return Ok(CallbackAction::Menu),
            "pay" => return Ok(CallbackAction::Pay),
            _ => {}
        }

        let (kind, rest) = s.split_once(':').ok_or_else(invalid)?;
        if rest.is_empty() {
            return Err(invalid());
        }

        match kind {
            "page" => rest.parse().map(CallbackAction::Page).map_err(|_| invalid()),
            "product" => Ok(CallbackAction::Product(rest.to_string())),
            "remove" => Ok(CallbackAction::Remove(rest.to_string())),
            "add" => {
                let (product_id, quantity) = rest.rsplit_once(':').ok_or_else(invalid)?;
                let quantity: u32 = quantity.parse().map_err(|_| invalid())?;
                if product_id.is_empty() || quantity == 0 {
                    return Err(invalid());
                }
                Ok(CallbackAction::AddToCart {
                    product_id: product_id.to_string(),
                    quantity,
                })
            }
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub action: CallbackAction,
}

impl Button {
    fn new(label: impl Into<String>, action: CallbackAction) -> Self {
        Self {
            label: label.into(),
            action,
        }
    }
}

/// Transport-neutral inline keyboard: a list of button rows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
}

impl Keyboard {
    fn push_row(&mut self, row: Vec<Button>) {
        if !row.is_empty() {
            self.rows.push(row);
        }
    }

    /// One row per product, then page navigation, then the cart
    pub fn catalog(page: &CatalogPage) -> Self {
        let mut keyboard = Keyboard::default();
        for product in page.products() {
            keyboard.push_row(vec![Button::new(
                product.name.clone(),
                CallbackAction::Product(product.id.clone()),
            )]);
        }

        let mut navigation = Vec::new();
        if page.has_previous() {
            navigation.push(Button::new(
                "« Previous",
                CallbackAction::Page(page.index() - 1),
            ));
        }
        if page.has_next() {
            navigation.push(Button::new("Next »", CallbackAction::Page(page.index() + 1)));
        }
        keyboard.push_row(navigation);

        keyboard.push_row(vec![Button::new("Cart", CallbackAction::Cart)]);
        keyboard
    }

    /// Quantity buttons the stock allows, then cart and back
    pub fn product(product: &Product, quantities: &[u32]) -> Self {
        let mut keyboard = Keyboard::default();
        keyboard.push_row(
            quantity_options(product.stock_level, quantities)
                .into_iter()
                .map(|quantity| {
                    Button::new(
                        format!("{quantity} pcs"),
                        CallbackAction::AddToCart {
                            product_id: product.id.clone(),
                            quantity,
                        },
                    )
                })
                .collect(),
        );
        keyboard.push_row(vec![Button::new("Cart", CallbackAction::Cart)]);
        keyboard.push_row(vec![Button::new("Back", CallbackAction::Back)]);
        keyboard
    }

    /// A remove button per line, then back to the menu and payment
    pub fn cart(cart: &Cart) -> Self {
        let mut keyboard = Keyboard::default();
        for item in &cart.items {
            keyboard.push_row(vec![Button::new(
                format!("Remove {}", item.name),
                CallbackAction::Remove(item.id.clone()),
            )]);
        }
        keyboard.push_row(vec![Button::new("To menu", CallbackAction::Menu)]);
        keyboard.push_row(vec![Button::new("Payment", CallbackAction::Pay)]);
        keyboard
    }
}

/// Configured quantities that do not exceed the stock level
pub fn quantity_options(stock_level: u32, configured: &[u32]) -> Vec<u32> {
    configured
        .iter()
        .copied()
        .filter(|&quantity| quantity <= stock_level)
        .collect()
}
