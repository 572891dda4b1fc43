//! Runtime for executing conversations
//!
//! Each active conversation gets its own worker task fed by an mpsc queue, so
//! events of one chat are handled strictly in order while different chats
//! proceed in parallel. Idle workers exit and are recreated on demand.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationController;
pub use traits::{Messenger, SessionStore};

use crate::commerce::{CommerceService, LoggingCommerce};
use crate::presentation::{CallbackAction, InvalidCallback};
use crate::state_machine::{ConversationId, Event};
use crate::store::RedisSessionStore;
use crate::telegram::TelegramMessenger;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = RuntimeManager<RedisSessionStore, LoggingCommerce, TelegramMessenger>;

const RESET_COMMAND: &str = "/start";

/// Attempts to hand an event to a worker that may be shutting down
const DISPATCH_ATTEMPTS: usize = 3;

const QUEUE_CAPACITY: usize = 32;

/// A transport-neutral inbound update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inbound {
    pub conversation_id: ConversationId,
    /// Used as the customer name at checkout
    pub sender_name: String,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    Text(String),
    Callback {
        query_id: String,
        /// Message carrying the pressed keyboard, when the transport still has it
        message_id: Option<i32>,
        payload: String,
    },
}

impl Inbound {
    pub fn to_event(&self) -> Result<Event, InvalidCallback> {
        match &self.kind {
            InboundKind::Text(text) if text.trim() == RESET_COMMAND => Ok(Event::Reset),
            InboundKind::Text(text) => Ok(Event::Text {
                text: text.clone(),
                sender: self.sender_name.clone(),
            }),
            InboundKind::Callback {
                query_id,
                message_id,
                payload,
            } => Ok(Event::Callback {
                query_id: query_id.clone(),
                message_id: *message_id,
                action: payload.parse::<CallbackAction>()?,
            }),
        }
    }

    /// The button press still waiting for an answer, if this is one
    pub fn callback_query_id(&self) -> Option<&str> {
        match &self.kind {
            InboundKind::Callback { query_id, .. } => Some(query_id.as_str()),
            InboundKind::Text(_) => None,
        }
    }
}

/// Handle to interact with a running conversation
struct ConversationHandle {
    event_tx: mpsc::Sender<Inbound>,
}

/// Live handles; a worker removes its own entry before it exits
type Conversations = Arc<Mutex<HashMap<ConversationId, ConversationHandle>>>;

/// Manager for all conversation workers
pub struct RuntimeManager<S, C, M>
where
    S: SessionStore + 'static,
    C: CommerceService + 'static,
    M: Messenger + 'static,
{
    controller: Arc<ConversationController<S, C, M>>,
    idle_timeout: Duration,
    conversations: Conversations,
}

impl<S, C, M> RuntimeManager<S, C, M>
where
    S: SessionStore + 'static,
    C: CommerceService + 'static,
    M: Messenger + 'static,
{
    pub fn new(controller: ConversationController<S, C, M>, idle_timeout: Duration) -> Self {
        Self {
            controller: Arc::new(controller),
            idle_timeout,
            conversations: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Queue an inbound event on its conversation's worker
    pub async fn dispatch(&self, inbound: Inbound) {
        let id = inbound.conversation_id;
        let mut inbound = inbound;

        for _ in 0..DISPATCH_ATTEMPTS {
            let event_tx = self.get_or_create(id).await;
            match event_tx.send(inbound).await {
                Ok(()) => return,
                // The worker went idle between lookup and send
                Err(mpsc::error::SendError(returned)) => {
                    tracing::debug!(conv_id = %id, "conversation worker closed, recreating");
                    inbound = returned;
                }
            }
        }

        tracing::error!(conv_id = %id, "no conversation worker accepted the event, dropping it");
    }

    /// Number of registered conversation workers
    #[cfg(test)]
    pub async fn active_conversations(&self) -> usize {
        self.conversations.lock().await.len()
    }

    async fn get_or_create(&self, id: ConversationId) -> mpsc::Sender<Inbound> {
        let mut conversations = self.conversations.lock().await;
        if let Some(handle) = conversations.get(&id) {
            if !handle.event_tx.is_closed() {
                return handle.event_tx.clone();
            }
        }

        // Drop handles of workers that died without deregistering
        conversations.retain(|_, handle| !handle.event_tx.is_closed());

        let (event_tx, event_rx) = mpsc::channel(QUEUE_CAPACITY);
        let worker = ConversationWorker {
            id,
            controller: Arc::clone(&self.controller),
            conversations: Arc::clone(&self.conversations),
            event_rx,
            idle_timeout: self.idle_timeout,
        };
        tokio::spawn(worker.run());

        conversations.insert(
            id,
            ConversationHandle {
                event_tx: event_tx.clone(),
            },
        );
        tracing::debug!(conv_id = %id, active = conversations.len(), "conversation worker created");
        event_tx
    }
}

struct ConversationWorker<S, C, M>
where
    S: SessionStore,
    C: CommerceService,
    M: Messenger,
{
    id: ConversationId,
    controller: Arc<ConversationController<S, C, M>>,
    conversations: Conversations,
    event_rx: mpsc::Receiver<Inbound>,
    idle_timeout: Duration,
}

impl<S, C, M> ConversationWorker<S, C, M>
where
    S: SessionStore,
    C: CommerceService,
    M: Messenger,
{
    async fn run(mut self) {
        tracing::debug!(conv_id = %self.id, "conversation worker started");

        loop {
            match tokio::time::timeout(self.idle_timeout, self.event_rx.recv()).await {
                Ok(Some(inbound)) => self.controller.process(&inbound).await,
                Ok(None) => break,
                Err(_) => {
                    if self.retire().await {
                        break;
                    }
                }
            }
        }

        tracing::debug!(conv_id = %self.id, "conversation worker stopped");
    }

    /// Deregister after an idle period unless events slipped in meanwhile
    ///
    /// Runs under the manager's lock so no second worker for this
    /// conversation can be created until the outcome is settled. Returns
    /// true when the worker should exit.
    async fn retire(&mut self) -> bool {
        let mut conversations = self.conversations.lock().await;

        self.event_rx.close();
        let mut pending = Vec::new();
        while let Some(inbound) = self.event_rx.recv().await {
            pending.push(inbound);
        }

        if pending.is_empty() {
            conversations.remove(&self.id);
            return true;
        }

        // Keep serving under a fresh queue; senders of the closed one retry
        let (event_tx, event_rx) = mpsc::channel(QUEUE_CAPACITY);
        conversations.insert(self.id, ConversationHandle { event_tx });
        self.event_rx = event_rx;
        drop(conversations);

        tracing::debug!(conv_id = %self.id, pending = pending.len(), "events arrived while idle");
        for inbound in pending {
            self.controller.process(&inbound).await;
        }
        false
    }
}
