//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the controller with mock implementations.

use crate::commerce::{Cart, CommerceService, CustomerOutcome, Product};
use crate::error::BackendError;
use crate::presentation::Keyboard;
use crate::state_machine::{ConvState, ConversationId};
use crate::store::StoreError;
use async_trait::async_trait;
use std::sync::Arc;

/// Storage for conversation state
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// `None` when the conversation never started or its session expired
    async fn get(&self, id: ConversationId) -> Result<Option<ConvState>, StoreError>;

    async fn set(&self, id: ConversationId, state: ConvState) -> Result<(), StoreError>;
}

/// Outbound side of the chat transport
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_text(
        &self,
        chat: ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BackendError>;

    async fn send_photo(
        &self,
        chat: ConversationId,
        image_url: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BackendError>;

    async fn delete_message(&self, chat: ConversationId, message_id: i32)
        -> Result<(), BackendError>;

    /// Stop the button's loading indicator, optionally with a notice or alert
    async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), BackendError>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: SessionStore + ?Sized> SessionStore for Arc<T> {
    async fn get(&self, id: ConversationId) -> Result<Option<ConvState>, StoreError> {
        (**self).get(id).await
    }

    async fn set(&self, id: ConversationId, state: ConvState) -> Result<(), StoreError> {
        (**self).set(id, state).await
    }
}

#[async_trait]
impl<T: Messenger + ?Sized> Messenger for Arc<T> {
    async fn send_text(
        &self,
        chat: ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BackendError> {
        (**self).send_text(chat, text, keyboard).await
    }

    async fn send_photo(
        &self,
        chat: ConversationId,
        image_url: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BackendError> {
        (**self).send_photo(chat, image_url, caption, keyboard).await
    }

    async fn delete_message(
        &self,
        chat: ConversationId,
        message_id: i32,
    ) -> Result<(), BackendError> {
        (**self).delete_message(chat, message_id).await
    }

    async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), BackendError> {
        (**self).answer_callback(query_id, text, show_alert).await
    }
}

#[async_trait]
impl<T: CommerceService + ?Sized> CommerceService for Arc<T> {
    async fn list_products(&self) -> Result<Vec<Product>, BackendError> {
        (**self).list_products().await
    }

    async fn get_product(&self, product_id: &str) -> Result<Product, BackendError> {
        (**self).get_product(product_id).await
    }

    async fn get_file_href(&self, file_id: &str) -> Result<String, BackendError> {
        (**self).get_file_href(file_id).await
    }

    async fn add_to_cart(
        &self,
        reference: &str,
        product_id: &str,
        quantity: u32,
    ) -> Result<(), BackendError> {
        (**self).add_to_cart(reference, product_id, quantity).await
    }

    async fn get_cart(&self, reference: &str) -> Result<Cart, BackendError> {
        (**self).get_cart(reference).await
    }

    async fn remove_cart_item(
        &self,
        reference: &str,
        cart_item_id: &str,
    ) -> Result<(), BackendError> {
        (**self).remove_cart_item(reference, cart_item_id).await
    }

    async fn create_customer(
        &self,
        name: &str,
        email: &str,
    ) -> Result<CustomerOutcome, BackendError> {
        (**self).create_customer(name, email).await
    }
}
