//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::*;
use crate::presentation::CallbackAction;
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_state() -> impl Strategy<Value = ConvState> {
    prop::sample::select(ConvState::ALL.to_vec())
}

fn arb_id() -> impl Strategy<Value = String> {
    "[a-f0-9]{8}"
}

fn arb_action() -> impl Strategy<Value = CallbackAction> {
    prop_oneof![
        (0usize..50).prop_map(CallbackAction::Page),
        arb_id().prop_map(CallbackAction::Product),
        (arb_id(), 1u32..20).prop_map(|(product_id, quantity)| CallbackAction::AddToCart {
            product_id,
            quantity
        }),
        arb_id().prop_map(CallbackAction::Remove),
        Just(CallbackAction::Cart),
        Just(CallbackAction::Back),
        Just(CallbackAction::Menu),
        Just(CallbackAction::Pay),
    ]
}

fn arb_callback() -> impl Strategy<Value = Event> {
    ("[a-z0-9]{6}", proptest::option::of(1i32..10_000), arb_action()).prop_map(
        |(query_id, message_id, action)| Event::Callback {
            query_id,
            message_id,
            action,
        },
    )
}

fn arb_text() -> impl Strategy<Value = Event> {
    ("[a-zA-Z0-9@. ]{0,30}", "[a-z]{1,10}")
        .prop_map(|(text, sender)| Event::Text { text, sender })
}

fn arb_outcome() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_id().prop_map(|email| Event::CustomerCreated { email }),
        arb_id().prop_map(|email| Event::CustomerDuplicate { email }),
        Just(Event::EmailRejected),
    ]
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![Just(Event::Reset), arb_text(), arb_callback(), arb_outcome()]
}

fn answer_count(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|e| matches!(e, Effect::AnswerCallback { .. }))
        .count()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn reset_always_lands_on_first_page(state in arb_state()) {
        let result = transition(state, Event::Reset);
        prop_assert_eq!(result.new_state, ConvState::BrowsingMenu);
        prop_assert_eq!(result.effects, vec![Effect::ShowCatalog { page: 0 }]);
    }

    #[test]
    fn transition_is_deterministic(state in arb_state(), event in arb_event()) {
        let first = transition(state, event.clone());
        let second = transition(state, event);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn every_button_press_is_answered_once_and_last(state in arb_state(), event in arb_callback()) {
        let result = transition(state, event);
        prop_assert_eq!(answer_count(&result.effects), 1);
        let answered_last = matches!(result.effects.last(), Some(Effect::AnswerCallback { .. }));
        prop_assert!(answered_last);
    }

    #[test]
    fn non_callback_events_never_answer(state in arb_state(), event in prop_oneof![arb_text(), arb_outcome()]) {
        let result = transition(state, event);
        prop_assert_eq!(answer_count(&result.effects), 0);
    }

    #[test]
    fn typed_text_outside_checkout_keeps_state(state in arb_state(), event in arb_text()) {
        prop_assume!(state != ConvState::Start && state != ConvState::AwaitingEmail);
        let result = transition(state, event);
        prop_assert_eq!(result.new_state, state);
    }

    #[test]
    fn page_navigation_renders_requested_page(page in 0usize..1000, message_id in proptest::option::of(1i32..100)) {
        let result = transition(ConvState::BrowsingMenu, Event::Callback {
            query_id: "q".to_string(),
            message_id,
            action: CallbackAction::Page(page),
        });
        prop_assert_eq!(result.new_state, ConvState::BrowsingMenu);
        let expected = Effect::ShowCatalog { page };
        prop_assert!(result.effects.contains(&expected));
    }
}
