//! # Watchlist
//!
//! The user's ordered list of avoided substances, and the store that
//! persists it.
//!
//! ## Ordering
//!
//! New entries are prepended, so the newest entry sits at position 0.
//! Duplicates are allowed and each occupies its own position; removal is
//! always by position.
//!
//! ## Persistence
//!
//! The whole list is stored as one JSON array of strings under a single
//! named record. Every mutation rewrites the record. A record that is
//! missing reads as an empty list; a record that cannot be decoded is an
//! error, and [`WatchlistStore::load`] turns that error into an empty list
//! rather than trying to salvage part of it.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::matcher;
use crate::observability;
use crate::storage::KeyValueStore;
use crate::validation::validate_watchlist_term;

/// Record name the watchlist is stored under
pub const WATCHLIST_STORAGE_KEY: &str = "my-watchlist";

/// Ordered, newest-first list of watchlist entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Watchlist {
    entries: Vec<String>,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-stored entries without re-validating them
    pub fn from_entries(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Add a term at the front of the list.
    ///
    /// The term is trimmed; empty or over-long input is rejected and leaves
    /// the list unchanged. Returns the entry as stored.
    pub fn add(&mut self, term: &str) -> AppResult<&str> {
        let trimmed = validate_watchlist_term(term).map_err(|reason| {
            AppError::Validation(format!("watchlist term rejected: {}", reason))
        })?;

        self.entries.insert(0, trimmed.to_string());
        Ok(&self.entries[0])
    }

    /// Remove the entry at `index` (0-based) and return it
    pub fn remove(&mut self, index: usize) -> AppResult<String> {
        if index >= self.entries.len() {
            return Err(AppError::Validation(format!(
                "position {} is out of range for a watchlist of {} entries",
                index + 1,
                self.entries.len()
            )));
        }
        Ok(self.entries.remove(index))
    }

    /// Watchlist entries found in `ingredients_text`, in list order
    pub fn find_in(&self, ingredients_text: &str) -> Vec<String> {
        matcher::find_matches(ingredients_text, &self.entries)
    }
}

/// Encode a watchlist as the JSON document that gets persisted
pub fn encode_watchlist(entries: &[String]) -> AppResult<String> {
    Ok(serde_json::to_string(entries)?)
}

/// Decode a persisted JSON document back into entries.
///
/// Anything other than an array of strings is rejected whole.
pub fn decode_watchlist(raw: &str) -> AppResult<Vec<String>> {
    Ok(serde_json::from_str::<Vec<String>>(raw)?)
}

/// Loads and saves a [`Watchlist`] through a [`KeyValueStore`]
#[derive(Debug, Clone)]
pub struct WatchlistStore<S> {
    store: S,
    key: String,
}

impl<S: KeyValueStore> WatchlistStore<S> {
    /// Store under the default record name
    pub fn new(store: S) -> Self {
        Self::with_key(store, WATCHLIST_STORAGE_KEY)
    }

    pub fn with_key(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Load the watchlist, reporting read and decode failures
    pub async fn try_load(&self) -> AppResult<Watchlist> {
        let start = Instant::now();
        let result = match self.store.get_item(&self.key).await {
            Ok(Some(raw)) => decode_watchlist(&raw).map(Watchlist::from_entries),
            Ok(None) => Ok(Watchlist::new()),
            Err(e) => Err(e),
        };
        observability::record_store_metrics("load", result.is_ok(), start.elapsed());

        if let Ok(watchlist) = &result {
            debug!(key = %self.key, entries = watchlist.len(), "Watchlist loaded");
        }
        result
    }

    /// Load the watchlist, treating any failure as an empty list
    pub async fn load(&self) -> Watchlist {
        match self.try_load().await {
            Ok(watchlist) => watchlist,
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to load watchlist, starting empty");
                Watchlist::new()
            }
        }
    }

    /// Overwrite the stored watchlist with `watchlist`
    pub async fn save(&self, watchlist: &Watchlist) -> AppResult<()> {
        let start = Instant::now();
        let result = match encode_watchlist(watchlist.entries()) {
            Ok(encoded) => self.store.set_item(&self.key, &encoded).await,
            Err(e) => Err(e),
        };
        observability::record_store_metrics("save", result.is_ok(), start.elapsed());

        if result.is_ok() {
            info!(key = %self.key, entries = watchlist.len(), "Watchlist saved");
        }
        result
    }
}
