//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `message_handler`: Routes text, commands, barcodes and unsupported media
//! - `command_handlers`: One handler per slash command
//! - `callback_handler`: Inline "❌" remove buttons
//! - `ui_builder`: Creates keyboards and formats messages

pub mod callback_handler;
pub mod command_handlers;
pub mod message_handler;
pub mod ui_builder;

use std::sync::Arc;

use crate::db::PgKeyValueStore;
use crate::localization::LocalizationManager;
use crate::lookup::OpenFoodFactsClient;
use crate::scanner::Scanner;
use crate::session::WatchlistSessions;

/// Per-chat watchlists backed by PostgreSQL
pub type BotSessions = WatchlistSessions<PgKeyValueStore>;

/// Shared dependencies handed to every handler
#[derive(Debug, Clone)]
pub struct BotDeps {
    pub sessions: Arc<BotSessions>,
    pub scanner: Arc<Scanner<OpenFoodFactsClient>>,
    pub localization: Arc<LocalizationManager>,
}

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use message_handler::message_handler;

pub use ui_builder::{create_watchlist_keyboard, format_aliases, format_scan_report, format_watchlist};
