//! Pure state transition function
//!
//! One handler per state, each matching every event and button kind, so a
//! new state, event or button does not compile until every state decides
//! what to do with it.

use super::{ConvState, Effect, Event};
use crate::presentation::{text, CallbackAction};

/// Result of a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
/// The executor runs the returned effects and persists `new_state`.
pub fn transition(state: ConvState, event: Event) -> TransitionResult {
    match state {
        ConvState::Start => start(event),
        ConvState::BrowsingMenu => browsing_menu(event),
        ConvState::ViewingProduct => viewing_product(event),
        ConvState::ViewingCart => viewing_cart(event),
        ConvState::AwaitingEmail => awaiting_email(event),
    }
}

// ============================================================
// Per-state handlers
// ============================================================

fn start(event: Event) -> TransitionResult {
    // The entry handler renders the first page whatever the trigger was
    match event {
        Event::Callback {
            query_id,
            message_id,
            action: _,
        } => switch_screen(
            ConvState::BrowsingMenu,
            Effect::ShowCatalog { page: 0 },
            query_id,
            message_id,
        ),
        Event::Reset
        | Event::Text { .. }
        | Event::CustomerCreated { .. }
        | Event::CustomerDuplicate { .. }
        | Event::EmailRejected => enter_catalog(),
    }
}

fn browsing_menu(event: Event) -> TransitionResult {
    const STATE: ConvState = ConvState::BrowsingMenu;
    match event {
        Event::Reset => enter_catalog(),
        Event::Text { .. } => typed_text_ignored(STATE),
        Event::Callback {
            query_id,
            message_id,
            action,
        } => match action {
            CallbackAction::Page(page) => {
                switch_screen(STATE, Effect::ShowCatalog { page }, query_id, message_id)
            }
            CallbackAction::Cart => {
                switch_screen(ConvState::ViewingCart, Effect::ShowCart, query_id, message_id)
            }
            CallbackAction::Product(product_id) => switch_screen(
                ConvState::ViewingProduct,
                Effect::ShowProduct { product_id },
                query_id,
                message_id,
            ),
            CallbackAction::AddToCart { .. }
            | CallbackAction::Remove(_)
            | CallbackAction::Back
            | CallbackAction::Menu
            | CallbackAction::Pay => stale_button(STATE, query_id),
        },
        Event::CustomerCreated { .. } | Event::CustomerDuplicate { .. } | Event::EmailRejected => {
            TransitionResult::new(STATE)
        }
    }
}

fn viewing_product(event: Event) -> TransitionResult {
    const STATE: ConvState = ConvState::ViewingProduct;
    match event {
        Event::Reset => enter_catalog(),
        Event::Text { .. } => typed_text_ignored(STATE),
        Event::Callback {
            query_id,
            message_id,
            action,
        } => match action {
            CallbackAction::Back => switch_screen(
                ConvState::BrowsingMenu,
                Effect::ShowCatalog { page: 0 },
                query_id,
                message_id,
            ),
            CallbackAction::Cart => {
                switch_screen(ConvState::ViewingCart, Effect::ShowCart, query_id, message_id)
            }
            CallbackAction::AddToCart {
                product_id,
                quantity,
            } => TransitionResult::new(STATE)
                .with_effect(Effect::AddToCart {
                    product_id: product_id.clone(),
                    quantity,
                })
                .with_effects(Effect::delete_message(message_id))
                .with_effect(Effect::ShowProduct { product_id })
                .with_effect(Effect::notice(query_id, text::added_to_cart(quantity))),
            CallbackAction::Page(_)
            | CallbackAction::Product(_)
            | CallbackAction::Remove(_)
            | CallbackAction::Menu
            | CallbackAction::Pay => stale_button(STATE, query_id),
        },
        Event::CustomerCreated { .. } | Event::CustomerDuplicate { .. } | Event::EmailRejected => {
            TransitionResult::new(STATE)
        }
    }
}

fn viewing_cart(event: Event) -> TransitionResult {
    const STATE: ConvState = ConvState::ViewingCart;
    match event {
        Event::Reset => enter_catalog(),
        Event::Text { .. } => typed_text_ignored(STATE),
        Event::Callback {
            query_id,
            message_id,
            action,
        } => match action {
            CallbackAction::Menu => switch_screen(
                ConvState::BrowsingMenu,
                Effect::ShowCatalog { page: 0 },
                query_id,
                message_id,
            ),
            // The cart stays on screen above the prompt
            CallbackAction::Pay => TransitionResult::new(ConvState::AwaitingEmail)
                .with_effect(Effect::PromptEmail { retry: false })
                .with_effect(Effect::ack(query_id)),
            CallbackAction::Remove(cart_item_id) => TransitionResult::new(STATE)
                .with_effect(Effect::RemoveFromCart { cart_item_id })
                .with_effects(Effect::delete_message(message_id))
                .with_effect(Effect::ShowCart)
                .with_effect(Effect::ack(query_id)),
            CallbackAction::Page(_)
            | CallbackAction::Product(_)
            | CallbackAction::AddToCart { .. }
            | CallbackAction::Cart
            | CallbackAction::Back => stale_button(STATE, query_id),
        },
        Event::CustomerCreated { .. } | Event::CustomerDuplicate { .. } | Event::EmailRejected => {
            TransitionResult::new(STATE)
        }
    }
}

fn awaiting_email(event: Event) -> TransitionResult {
    const STATE: ConvState = ConvState::AwaitingEmail;
    match event {
        Event::Reset => enter_catalog(),
        Event::Text { text, sender } => TransitionResult::new(STATE).with_effect(
            Effect::CreateCustomer {
                name: sender,
                email: text.trim().to_string(),
            },
        ),
        Event::EmailRejected => {
            TransitionResult::new(STATE).with_effect(Effect::PromptEmail { retry: true })
        }
        Event::CustomerCreated { email } | Event::CustomerDuplicate { email } => {
            TransitionResult::new(ConvState::BrowsingMenu)
                .with_effect(Effect::ConfirmOrder { email })
                .with_effect(Effect::ShowCatalog { page: 0 })
        }
        Event::Callback {
            query_id,
            message_id: _,
            action: _,
        } => stale_button(STATE, query_id),
    }
}

// ============================================================
// Shared transitions
// ============================================================

fn enter_catalog() -> TransitionResult {
    TransitionResult::new(ConvState::BrowsingMenu).with_effect(Effect::ShowCatalog { page: 0 })
}

/// Replace the screen whose button was pressed, then stop the spinner
fn switch_screen(
    next: ConvState,
    render: Effect,
    query_id: String,
    message_id: Option<i32>,
) -> TransitionResult {
    TransitionResult::new(next)
        .with_effects(Effect::delete_message(message_id))
        .with_effect(render)
        .with_effect(Effect::ack(query_id))
}

fn stale_button(state: ConvState, query_id: String) -> TransitionResult {
    TransitionResult::new(state).with_effect(Effect::alert(query_id, text::STALE_BUTTON))
}

fn typed_text_ignored(state: ConvState) -> TransitionResult {
    TransitionResult::new(state).with_effect(Effect::SendHint {
        text: text::USE_BUTTONS.to_string(),
    })
}
