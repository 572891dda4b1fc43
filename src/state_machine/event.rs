//! Events that can occur in a conversation

use crate::presentation::CallbackAction;

/// Events that trigger state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    // User events
    /// The `/start` command: a hard reset of the conversation
    Reset,
    Text {
        text: String,
        /// Display name of the sender, used for the customer record
        sender: String,
    },
    Callback {
        query_id: String,
        /// Message carrying the pressed keyboard, when Telegram still has it
        message_id: Option<i32>,
        action: CallbackAction,
    },

    // Commerce outcomes
    CustomerCreated {
        email: String,
    },
    CustomerDuplicate {
        email: String,
    },
    EmailRejected,
}
