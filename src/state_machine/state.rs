//! Conversation state types

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Conversation Identity
// ============================================================================

/// Stable identifier of a conversation (the Telegram chat id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConversationId(pub i64);

impl ConversationId {
    /// Key under which the commerce backend keeps this conversation's cart
    pub fn cart_reference(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Conversation State
// ============================================================================

/// Conversation state
///
/// Exactly one state is active per conversation. The session store keeps it
/// as a text label, see [`ConvState::label`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConvState {
    /// Reset point: whatever arrives next renders the first catalog page
    #[default]
    Start,

    /// A catalog page is on screen
    BrowsingMenu,

    /// A product card with quantity buttons is on screen
    ViewingProduct,

    /// The cart summary is on screen
    ViewingCart,

    /// Checkout started, the next text message is taken as the email
    AwaitingEmail,
}

impl ConvState {
    pub const ALL: [ConvState; 5] = [
        ConvState::Start,
        ConvState::BrowsingMenu,
        ConvState::ViewingProduct,
        ConvState::ViewingCart,
        ConvState::AwaitingEmail,
    ];

    /// Text label used in the session store
    pub fn label(self) -> &'static str {
        match self {
            ConvState::Start => "start",
            ConvState::BrowsingMenu => "browsing_menu",
            ConvState::ViewingProduct => "viewing_product",
            ConvState::ViewingCart => "viewing_cart",
            ConvState::AwaitingEmail => "awaiting_email",
        }
    }
}

impl fmt::Display for ConvState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stored label that names no known state
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown conversation state label: {0:?}")]
pub struct UnknownStateLabel(pub String);

impl FromStr for ConvState {
    type Err = UnknownStateLabel;

    fn from_str(label: &str) -> Result<Self, Self::Err> {
        ConvState::ALL
            .into_iter()
            .find(|state| state.label() == label)
            .ok_or_else(|| UnknownStateLabel(label.to_string()))
    }
}
