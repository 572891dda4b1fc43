//! Mock implementations for testing
//!
//! These mocks enable controller and runtime tests without real I/O.

use super::traits::{Messenger, SessionStore};
use crate::commerce::{Cart, CartItem, CommerceService, Customer, CustomerOutcome, Product};
use crate::error::BackendError;
use crate::presentation::Keyboard;
use crate::state_machine::{ConvState, ConversationId};
use crate::store::{decode_label, state_key, StoreError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// In-Memory Session Store
// ============================================================================

/// Session store keeping raw labels, so corrupt entries can be planted
#[derive(Default)]
pub struct InMemorySessionStore {
    labels: Mutex<HashMap<ConversationId, String>>,
    fail_writes: AtomicBool,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(id: ConversationId, state: ConvState) -> Self {
        let store = Self::new();
        store.insert_raw(id, state.label());
        store
    }

    pub fn insert_raw(&self, id: ConversationId, label: &str) {
        self.labels.lock().unwrap().insert(id, label.to_string());
    }

    pub fn state(&self, id: ConversationId) -> Option<ConvState> {
        self.labels
            .lock()
            .unwrap()
            .get(&id)
            .map(|label| label.parse().unwrap())
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, id: ConversationId) -> Result<Option<ConvState>, StoreError> {
        let label = self.labels.lock().unwrap().get(&id).cloned();
        label
            .map(|label| decode_label(&state_key(id), &label))
            .transpose()
    }

    async fn set(&self, id: ConversationId, state: ConvState) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "mock write failure",
            ))));
        }
        self.insert_raw(id, state.label());
        Ok(())
    }
}

// ============================================================================
// Mock Commerce Backend
// ============================================================================

/// Commerce backend with an in-memory catalog and carts
///
/// Every product costs `$1.00`, so totals are easy to predict.
#[derive(Default)]
pub struct MockCommerce {
    products: Vec<Product>,
    carts: Mutex<HashMap<String, Vec<CartItem>>>,
    customer_outcomes: Mutex<VecDeque<CustomerOutcome>>,
    /// Customers the backend actually created
    pub customers: Mutex<Vec<Customer>>,
    fail_all: AtomicBool,
}

impl MockCommerce {
    pub fn new(products: Vec<Product>) -> Self {
        Self {
            products,
            ..Self::default()
        }
    }

    /// Queue the outcome of the next customer submission; defaults to created
    pub fn queue_customer_outcome(&self, outcome: CustomerOutcome) {
        self.customer_outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    pub fn cart_items(&self, reference: &str) -> Vec<CartItem> {
        self.carts
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .unwrap_or_default()
    }

    fn check(&self) -> Result<(), BackendError> {
        if self.fail_all.load(Ordering::SeqCst) {
            Err(BackendError::new(503, "mock backend unavailable"))
        } else {
            Ok(())
        }
    }

    fn find(&self, product_id: &str) -> Result<&Product, BackendError> {
        self.products
            .iter()
            .find(|p| p.id == product_id)
            .ok_or_else(|| BackendError::new(404, format!("no product {product_id}")))
    }
}

#[async_trait]
impl CommerceService for MockCommerce {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        self.check()?;
        Ok(self.products.clone())
    }

    async fn get_product(&self, product_id: &str) -> Result<Product, BackendError> {
        self.check()?;
        self.find(product_id).cloned()
    }

    async fn get_file_href(&self, file_id: &str) -> Result<String, BackendError> {
        self.check()?;
        Ok(format!("https://files.example.com/{file_id}.jpg"))
    }

    async fn add_to_cart(
        &self,
        reference: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), BackendError> {
        self.check()?;
        let product = self.find(product_id)?;
        let mut carts = self.carts.lock().unwrap();
        let items = carts.entry(reference.to_string()).or_default();
        let index = match items.iter().position(|i| i.product_id == product_id) {
            Some(index) => index,
            None => {
                items.push(CartItem {
                    id: format!("item-{product_id}"),
                    product_id: product_id.to_string(),
                    name: product.name.clone(),
                    description: product.description.clone(),
                    quantity: 0,
                    unit_price: "$1.00".to_string(),
                    line_total: String::new(),
                });
                items.len() - 1
            }
        };
        let item = &mut items[index];
        item.quantity += quantity;
        item.line_total = format!("${}.00", item.quantity);
        Ok(())
    }

    async fn get_cart(&self, reference: &str) -> Result<Cart, BackendError> {
        self.check()?;
        let items = self.cart_items(reference);
        let total: u32 = items.iter().map(|i| i.quantity).sum();
        Ok(Cart {
            items,
            total: format!("${total}.00"),
        })
    }

    async fn remove_cart_item(
        &self,
        reference: &str,
        cart_item_id: &str,
    ) -> Result<(), BackendError> {
        self.check()?;
        if let Some(items) = self.carts.lock().unwrap().get_mut(reference) {
            items.retain(|i| i.id != cart_item_id);
        }
        Ok(())
    }

    async fn create_customer(
        &self,
        name: &str,
        email: &str,
    ) -> Result<CustomerOutcome, BackendError> {
        self.check()?;
        let outcome = self
            .customer_outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                CustomerOutcome::Created(Customer {
                    id: format!("cust-{}", self.customers.lock().unwrap().len() + 1),
                    name: name.to_string(),
                    email: email.to_string(),
                })
            });
        if let CustomerOutcome::Created(customer) = &outcome {
            self.customers.lock().unwrap().push(customer.clone());
        }
        Ok(outcome)
    }
}

// ============================================================================
// Mock Messenger
// ============================================================================

/// Everything the bot put on the wire, in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        chat: ConversationId,
        text: String,
        keyboard: Option<Keyboard>,
    },
    Photo {
        chat: ConversationId,
        image_url: String,
        caption: String,
        keyboard: Option<Keyboard>,
    },
    Deleted {
        chat: ConversationId,
        message_id: i32,
    },
    Answer {
        query_id: String,
        text: Option<String>,
        show_alert: bool,
    },
}

#[derive(Default)]
pub struct MockMessenger {
    pub sent: Mutex<Vec<Sent>>,
    fail_deletes: AtomicBool,
}

impl MockMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Texts and photo captions, in the order they were sent
    pub fn texts(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|sent| match sent {
                Sent::Text { text, .. } => Some(text.clone()),
                Sent::Photo { caption, .. } => Some(caption.clone()),
                Sent::Deleted { .. } | Sent::Answer { .. } => None,
            })
            .collect()
    }

    pub fn answers(&self) -> Vec<(String, Option<String>, bool)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter_map(|sent| match sent {
                Sent::Answer {
                    query_id,
                    text,
                    show_alert,
                } => Some((query_id.clone(), text.clone(), *show_alert)),
                _ => None,
            })
            .collect()
    }

    /// Keyboard of the most recent text or photo
    pub fn last_keyboard(&self) -> Option<Keyboard> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find_map(|sent| match sent {
                Sent::Text { keyboard, .. } | Sent::Photo { keyboard, .. } => {
                    Some(keyboard.clone())
                }
                _ => None,
            })
            .flatten()
    }
}

#[async_trait]
impl Messenger for MockMessenger {
    async fn send_text(
        &self,
        chat: ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BackendError> {
        self.sent.lock().unwrap().push(Sent::Text {
            chat,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn send_photo(
        &self,
        chat: ConversationId,
        image_url: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BackendError> {
        self.sent.lock().unwrap().push(Sent::Photo {
            chat,
            image_url: image_url.to_string(),
            caption: caption.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn delete_message(
        &self,
        chat: ConversationId,
        message_id: i32,
    ) -> Result<(), BackendError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(BackendError::new(400, "message to delete not found"));
        }
        self.sent
            .lock()
            .unwrap()
            .push(Sent::Deleted { chat, message_id });
        Ok(())
    }

    async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), BackendError> {
        self.sent.lock().unwrap().push(Sent::Answer {
            query_id: query_id.to_string(),
            text: text.map(str::to_string),
            show_alert,
        });
        Ok(())
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn product(id: &str, name: &str, stock_level: u32) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("About {name}"),
        display_price: "$1.00".to_string(),
        weight_kg: 1.0,
        stock_level,
        main_image_id: None,
    }
}
