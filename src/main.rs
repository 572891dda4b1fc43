//! Storefront bot - a Telegram shop over the Elastic Path commerce API
//!
//! Each chat walks a small state machine (catalog, product, cart, checkout)
//! whose current state lives in Redis.

mod commerce;
mod config;
mod error;
mod presentation;
mod runtime;
mod state_machine;
mod store;
mod telegram;

use commerce::{ElasticPathClient, LoggingCommerce};
use config::Config;
use runtime::{ConversationController, ProductionRuntime, RuntimeManager};
use std::sync::Arc;
use store::RedisSessionStore;
use telegram::TelegramMessenger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_bot=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        commerce_base_url = %config.commerce_base_url,
        redis_host = %config.redis_host,
        redis_port = config.redis_port,
        page_size = config.storefront.page_size.get(),
        quantities = ?config.storefront.quantity_options,
        proxy = config.proxy.is_some(),
        "configuration loaded"
    );

    let store = RedisSessionStore::connect(&config.redis_url()?, config.session_ttl_secs).await?;

    let client = ElasticPathClient::new(
        config.commerce_client_id.clone(),
        &config.commerce_base_url,
        config.http_timeout,
    )?;
    let commerce = LoggingCommerce::new(Arc::new(client));

    let bot = telegram::build_bot(&config.bot_token, config.proxy.as_deref())?;
    let messenger = TelegramMessenger::new(bot.clone());

    let controller = ConversationController::new(store, commerce, messenger, config.storefront);
    let runtime: Arc<ProductionRuntime> =
        Arc::new(RuntimeManager::new(controller, config.conversation_idle));

    telegram::run_listener(bot, runtime).await;
    Ok(())
}
