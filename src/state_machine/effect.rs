//! Effects produced by state transitions

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Render a catalog page; the index is clamped to the pages that exist
    ShowCatalog { page: usize },

    /// Render a product card together with its line in the cart
    ShowProduct { product_id: String },

    /// Render the cart summary
    ShowCart,

    AddToCart { product_id: String, quantity: u32 },

    RemoveFromCart { cart_item_id: String },

    /// Ask for an email address, `retry` after the backend rejected one
    PromptEmail { retry: bool },

    /// Submit the customer record (yields an outcome event)
    CreateCustomer { name: String, email: String },

    /// Thank the user and repeat what is in the cart
    ConfirmOrder { email: String },

    /// Remove the message that carried a pressed keyboard
    DeleteMessage { message_id: i32 },

    /// Stop the loading indicator on a pressed button
    AnswerCallback {
        query_id: String,
        text: Option<String>,
        show_alert: bool,
    },

    /// Tell the user that typed text does not apply here
    SendHint { text: String },
}

impl Effect {
    pub fn ack(query_id: impl Into<String>) -> Self {
        Effect::AnswerCallback {
            query_id: query_id.into(),
            text: None,
            show_alert: false,
        }
    }

    pub fn notice(query_id: impl Into<String>, text: impl Into<String>) -> Self {
        Effect::AnswerCallback {
            query_id: query_id.into(),
            text: Some(text.into()),
            show_alert: false,
        }
    }

    pub fn alert(query_id: impl Into<String>, text: impl Into<String>) -> Self {
        Effect::AnswerCallback {
            query_id: query_id.into(),
            text: Some(text.into()),
            show_alert: true,
        }
    }

    /// Delete the pressed keyboard's message, if there is one to delete
    pub fn delete_message(message_id: Option<i32>) -> Option<Self> {
        message_id.map(|message_id| Effect::DeleteMessage { message_id })
    }
}
