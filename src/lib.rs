//! # Watchlist Scanner Telegram Bot
//!
//! A Telegram bot that looks up a product by barcode on Open Food Facts and
//! warns the user when its ingredients contain anything on their personal
//! watchlist, including known synonyms of watched ingredients.

pub mod aliases;
pub mod bot;
pub mod config;
pub mod db;
pub mod dialogue;
pub mod errors;
pub mod localization;
pub mod lookup;
pub mod matcher;
pub mod observability;
pub mod observability_config;
pub mod product;
pub mod scanner;
pub mod session;
pub mod storage;
pub mod validation;
pub mod watchlist;

// Re-export types for easier access
pub use aliases::{AliasTable, ALIAS_TABLE};
pub use matcher::find_matches;
pub use product::{NovaScore, ProductRecord};
pub use scanner::{ScanError, ScanReport, Scanner};
pub use watchlist::{Watchlist, WatchlistStore};
