//! Telegram transport: long-polling listener and the outbound messenger

use crate::error::BackendError;
use crate::presentation::Keyboard;
use crate::runtime::{Inbound, InboundKind, Messenger, ProductionRuntime};
use crate::state_machine::ConversationId;
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{
    CallbackQueryId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, User,
};
use teloxide::RequestError;

/// Build the bot client, routing its traffic through `proxy` when given
pub fn build_bot(token: &str, proxy: Option<&str>) -> Result<Bot, BackendError> {
    let Some(proxy) = proxy else {
        return Ok(Bot::new(token));
    };

    let proxy = reqwest::Proxy::all(proxy)
        .map_err(|e| BackendError::transport(format!("invalid proxy URL: {e}")))?;
    let client = teloxide::net::default_reqwest_settings()
        .proxy(proxy)
        .build()
        .map_err(|e| BackendError::transport(format!("failed to build Telegram client: {e}")))?;
    tracing::info!("Telegram client uses the configured proxy");
    Ok(Bot::with_client(token, client))
}

/// Poll for updates and hand them to the runtime until Ctrl-C
pub async fn run_listener(bot: Bot, runtime: Arc<ProductionRuntime>) {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    tracing::info!("starting Telegram long polling");
    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![runtime])
        .default_handler(|_| async {}) // Silently ignore other update kinds
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
    tracing::info!("Telegram long polling stopped");
}

#[allow(clippy::needless_pass_by_value)] // dptree injects owned values
async fn on_message(msg: Message, runtime: Arc<ProductionRuntime>) -> ResponseResult<()> {
    if let Some(inbound) = inbound_from_message(&msg) {
        runtime.dispatch(inbound).await;
    } else {
        tracing::debug!(chat_id = msg.chat.id.0, "ignoring message without text");
    }
    respond(())
}

#[allow(clippy::needless_pass_by_value)] // dptree injects owned values
async fn on_callback(query: CallbackQuery, runtime: Arc<ProductionRuntime>) -> ResponseResult<()> {
    if let Some(inbound) = inbound_from_callback(&query) {
        runtime.dispatch(inbound).await;
    } else {
        tracing::debug!(query_id = %query.id.0, "ignoring callback without chat message");
    }
    respond(())
}

/// Username, then first name, then a synthetic name from the chat id
fn sender_name(user: Option<&User>, chat_id: i64) -> String {
    user.and_then(|u| u.username.clone())
        .or_else(|| {
            user.map(|u| u.first_name.clone())
                .filter(|name| !name.is_empty())
        })
        .unwrap_or_else(|| format!("chat {chat_id}"))
}

fn inbound_from_message(msg: &Message) -> Option<Inbound> {
    let text = msg.text()?;
    let chat_id = msg.chat.id.0;
    Some(Inbound {
        conversation_id: ConversationId(chat_id),
        sender_name: sender_name(msg.from.as_ref(), chat_id),
        kind: InboundKind::Text(text.to_string()),
    })
}

fn inbound_from_callback(query: &CallbackQuery) -> Option<Inbound> {
    let message = query.message.as_ref()?;
    let chat_id = message.chat().id.0;
    Some(Inbound {
        conversation_id: ConversationId(chat_id),
        sender_name: sender_name(Some(&query.from), chat_id),
        kind: InboundKind::Callback {
            query_id: query.id.0.clone(),
            message_id: Some(message.id().0),
            payload: query.data.clone().unwrap_or_default(),
        },
    })
}

fn markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(&button.label, button.action.to_string()))
            .collect::<Vec<_>>()
    }))
}

fn request_error(operation: &str, error: &RequestError) -> BackendError {
    BackendError::transport(format!("telegram {operation} failed: {error}"))
}

/// Messenger backed by the Telegram Bot API
#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_text(
        &self,
        chat: ConversationId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BackendError> {
        let mut request = self.bot.send_message(ChatId(chat.0), text);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        request
            .await
            .map_err(|e| request_error("sendMessage", &e))?;
        Ok(())
    }

    async fn send_photo(
        &self,
        chat: ConversationId,
        image_url: &str,
        caption: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), BackendError> {
        let url = reqwest::Url::parse(image_url)
            .map_err(|e| BackendError::transport(format!("invalid image URL {image_url}: {e}")))?;
        let mut request = self
            .bot
            .send_photo(ChatId(chat.0), InputFile::url(url))
            .caption(caption);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(markup(keyboard));
        }
        request.await.map_err(|e| request_error("sendPhoto", &e))?;
        Ok(())
    }

    async fn delete_message(
        &self,
        chat: ConversationId,
        message_id: i32,
    ) -> Result<(), BackendError> {
        self.bot
            .delete_message(ChatId(chat.0), MessageId(message_id))
            .await
            .map_err(|e| request_error("deleteMessage", &e))?;
        Ok(())
    }

    async fn answer_callback(
        &self,
        query_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), BackendError> {
        let mut request = self
            .bot
            .answer_callback_query(CallbackQueryId(query_id.to_string()));
        if let Some(text) = text {
            request = request.text(text).show_alert(show_alert);
        }
        request
            .await
            .map_err(|e| request_error("answerCallbackQuery", &e))?;
        Ok(())
    }
}
