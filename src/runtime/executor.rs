//! Conversation controller: loads state, runs the transition, executes
//! effects and persists the result

use super::traits::{Messenger, SessionStore};
use super::Inbound;
use crate::commerce::{CommerceService, CustomerOutcome};
use crate::config::StorefrontSettings;
use crate::error::ControllerError;
use crate::presentation::{text, CatalogPage, Keyboard};
use crate::state_machine::{transition, ConvState, ConversationId, Effect, Event};

/// Handles inbound events for any conversation
///
/// Holds no per-conversation data; the runtime manager guarantees that events
/// of one conversation reach `handle` one at a time.
pub struct ConversationController<S, C, M>
where
    S: SessionStore,
    C: CommerceService,
    M: Messenger,
{
    store: S,
    commerce: C,
    messenger: M,
    settings: StorefrontSettings,
}

impl<S, C, M> ConversationController<S, C, M>
where
    S: SessionStore,
    C: CommerceService,
    M: Messenger,
{
    pub fn new(store: S, commerce: C, messenger: M, settings: StorefrontSettings) -> Self {
        Self {
            store,
            commerce,
            messenger,
            settings,
        }
    }

    /// Handle one inbound event, reporting any failure to the user
    pub async fn process(&self, inbound: &Inbound) {
        if let Err(e) = self.handle(inbound).await {
            self.report_failure(inbound, &e).await;
        }
    }

    pub async fn handle(&self, inbound: &Inbound) -> Result<(), ControllerError> {
        let id = inbound.conversation_id;
        let event = inbound.to_event()?;

        let mut state = if event == Event::Reset {
            self.store.set(id, ConvState::Start).await?;
            ConvState::Start
        } else {
            self.store
                .get(id)
                .await?
                .ok_or(ControllerError::StateLookup {
                    conversation_id: id,
                })?
        };

        // Effects may generate follow-up events, processed in the same pass
        let mut pending = vec![event];
        while let Some(event) = pending.pop() {
            let result = transition(state, event);
            if result.new_state != state {
                tracing::debug!(conv_id = %id, from = %state, to = %result.new_state, "state transition");
            }
            state = result.new_state;

            for effect in result.effects {
                if let Some(generated) = self.execute_effect(id, effect).await? {
                    pending.push(generated);
                }
            }
        }

        // Effects already ran; a failed write here is not rolled back
        self.store.set(id, state).await.inspect_err(|e| {
            tracing::error!(conv_id = %id, state = %state, error = %e, "effects applied but state not persisted");
        })?;
        Ok(())
    }

    #[allow(clippy::too_many_lines)] // One arm per effect
    async fn execute_effect(
        &self,
        id: ConversationId,
        effect: Effect,
    ) -> Result<Option<Event>, ControllerError> {
        match effect {
            Effect::ShowCatalog { page } => {
                let products = self.commerce.list_products().await?;
                let page = CatalogPage::new(products, self.settings.page_size, page);
                self.messenger
                    .send_text(
                        id,
                        &text::catalog_caption(&page),
                        Some(&Keyboard::catalog(&page)),
                    )
                    .await?;
                Ok(None)
            }

            Effect::ShowProduct { product_id } => {
                let product = self.commerce.get_product(&product_id).await?;
                let cart = self.commerce.get_cart(&id.cart_reference()).await?;
                let caption = text::product_caption(&product, cart.line_for(&product.id));
                let keyboard = Keyboard::product(&product, &self.settings.quantity_options);

                if let Some(file_id) = &product.main_image_id {
                    let href = self.commerce.get_file_href(file_id).await?;
                    self.messenger
                        .send_photo(id, &href, &text::photo_caption(&caption), Some(&keyboard))
                        .await?;
                } else {
                    self.messenger
                        .send_text(id, &caption, Some(&keyboard))
                        .await?;
                }
                Ok(None)
            }

            Effect::ShowCart => {
                let cart = self.commerce.get_cart(&id.cart_reference()).await?;
                self.messenger
                    .send_text(id, &text::cart_summary(&cart), Some(&Keyboard::cart(&cart)))
                    .await?;
                Ok(None)
            }

            Effect::AddToCart {
                product_id,
                quantity,
            } => {
                self.commerce
                    .add_to_cart(&id.cart_reference(), &product_id, quantity)
                    .await?;
                tracing::info!(conv_id = %id, product_id = %product_id, quantity, "added to cart");
                Ok(None)
            }

            Effect::RemoveFromCart { cart_item_id } => {
                self.commerce
                    .remove_cart_item(&id.cart_reference(), &cart_item_id)
                    .await?;
                tracing::info!(conv_id = %id, cart_item_id = %cart_item_id, "removed from cart");
                Ok(None)
            }

            Effect::PromptEmail { retry } => {
                self.messenger
                    .send_text(id, text::email_prompt(retry), None)
                    .await?;
                Ok(None)
            }

            Effect::CreateCustomer { name, email } => {
                let outcome = self.commerce.create_customer(&name, &email).await?;
                let event = match outcome {
                    CustomerOutcome::Created(customer) => {
                        tracing::info!(
                            conv_id = %id,
                            customer_id = %customer.id,
                            name = %customer.name,
                            "customer created"
                        );
                        Event::CustomerCreated {
                            email: customer.email,
                        }
                    }
                    CustomerOutcome::Duplicate => Event::CustomerDuplicate { email },
                    CustomerOutcome::Invalid => Event::EmailRejected,
                };
                Ok(Some(event))
            }

            Effect::ConfirmOrder { email } => {
                let cart = self.commerce.get_cart(&id.cart_reference()).await?;
                self.messenger
                    .send_text(id, &text::order_confirmation(&email, &cart), None)
                    .await?;
                Ok(None)
            }

            Effect::DeleteMessage { message_id } => {
                // Old screens may already be gone or too old to delete
                if let Err(e) = self.messenger.delete_message(id, message_id).await {
                    tracing::warn!(conv_id = %id, message_id, error = %e, "failed to delete message");
                }
                Ok(None)
            }

            Effect::AnswerCallback {
                query_id,
                text,
                show_alert,
            } => {
                self.messenger
                    .answer_callback(&query_id, text.as_deref(), show_alert)
                    .await?;
                Ok(None)
            }

            Effect::SendHint { text } => {
                self.messenger.send_text(id, &text, None).await?;
                Ok(None)
            }
        }
    }

    async fn report_failure(&self, inbound: &Inbound, error: &ControllerError) {
        let id = inbound.conversation_id;
        tracing::error!(conv_id = %id, error = %error, "failed to handle event");

        if let Some(query_id) = inbound.callback_query_id() {
            if let Err(e) = self
                .messenger
                .answer_callback(query_id, Some(text::FAILURE_NOTICE), true)
                .await
            {
                tracing::warn!(conv_id = %id, error = %e, "failed to answer callback after error");
            }
        }

        if let Err(e) = self
            .messenger
            .send_text(id, text::FAILURE_NOTICE, None)
            .await
        {
            tracing::warn!(conv_id = %id, error = %e, "failed to send failure notice");
        }
    }
}
