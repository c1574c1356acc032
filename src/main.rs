use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use tracing::info;
use watchlist_scanner::bot::{self, BotDeps};
use watchlist_scanner::config::AppConfig;
use watchlist_scanner::db::{self, PgKeyValueStore};
use watchlist_scanner::dialogue::{WatchlistDialogue, WatchlistDialogueState};
use watchlist_scanner::errors::error_logging;
use watchlist_scanner::localization;
use watchlist_scanner::lookup::OpenFoodFactsClient;
use watchlist_scanner::observability;
use watchlist_scanner::scanner::Scanner;
use watchlist_scanner::session::WatchlistSessions;
use watchlist_scanner::watchlist::WatchlistStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    if let Err(e) = config.validate() {
        error_logging::log_config_error(&e, "app_config", "startup_validation");
        return Err(e.into());
    }

    // Create database connection pool
    let pool = db::connect(&config.database).await?;
    db::init_database_schema(&pool).await?;
    let shared_pool = Arc::new(pool);

    // Initialize complete observability stack (metrics, tracing, logging)
    observability::init_observability_with_config(
        config.observability.clone(),
        Some(Arc::clone(&shared_pool)),
    )
    .await?;
    info!(config = %config.summary(), "Configuration loaded");

    // Initialize localization manager
    let localization_manager = localization::create_localization_manager()?;

    let lookup = OpenFoodFactsClient::new(&config.lookup)?;
    let scanner = Arc::new(Scanner::new(lookup));

    let sessions = {
        let pool = Arc::clone(&shared_pool);
        Arc::new(WatchlistSessions::new(move |chat_id| {
            WatchlistStore::new(PgKeyValueStore::new(Arc::clone(&pool), chat_id))
        }))
    };

    let deps = BotDeps {
        sessions,
        scanner,
        localization: localization_manager,
    };

    // Initialize the bot with custom client configuration for better reliability
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.bot.http_timeout_secs))
        .build()?;
    let bot = Bot::with_client(config.bot.token.clone(), client);

    info!(
        timeout_secs = config.bot.http_timeout_secs,
        "Bot initialized, starting dispatcher"
    );

    // Create shared dialogue storage
    let dialogue_storage = InMemStorage::<WatchlistDialogueState>::new();

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint({
            let deps = deps.clone();
            let storage = dialogue_storage.clone();
            move |bot: Bot, msg: Message| {
                let deps = deps.clone();
                let dialogue = WatchlistDialogue::new(storage.clone(), msg.chat.id);
                async move { bot::message_handler(bot, msg, deps, dialogue).await }
            }
        }))
        .branch(Update::filter_callback_query().endpoint({
            let deps = deps.clone();
            move |bot: Bot, q: CallbackQuery| {
                let deps = deps.clone();
                async move { bot::callback_handler(bot, q, deps).await }
            }
        }));

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
