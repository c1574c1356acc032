//! # Watchlist Sessions
//!
//! Per-chat, in-memory watchlists backed by a [`WatchlistStore`].
//!
//! A chat's watchlist is loaded from the store the first time the chat needs
//! it and kept in memory afterwards. Every add or remove is applied in
//! memory first and then the whole list is saved. If the save fails, the
//! in-memory list stays as it is and remains the source of truth for the
//! session; the next successful save brings the stored copy back in line.
//!
//! The lock around the session map is never held across an `.await`.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::errors::{error_logging, AppError, AppResult};
use crate::observability::{self, WatchlistAction};
use crate::storage::KeyValueStore;
use crate::watchlist::{Watchlist, WatchlistStore};

/// A chat's watchlist, plus the error if loading it failed
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedWatchlist {
    pub watchlist: Watchlist,
    /// Set only on the load that failed; the watchlist is then empty
    pub load_error: Option<AppError>,
}

/// Result of an add or remove that passed validation
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    /// The entry that was added or removed
    pub entry: String,
    /// The watchlist after the change
    pub watchlist: Watchlist,
    /// Set when the change could not be persisted
    pub save_error: Option<AppError>,
}

type StoreFactory<S> = Box<dyn Fn(i64) -> WatchlistStore<S> + Send + Sync>;

/// In-memory watchlists keyed by chat
pub struct WatchlistSessions<S> {
    sessions: Mutex<HashMap<i64, Watchlist>>,
    store_for: StoreFactory<S>,
}

impl<S> std::fmt::Debug for WatchlistSessions<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchlistSessions")
            .field("sessions", &self.sessions.lock().len())
            .finish()
    }
}

impl<S: KeyValueStore> WatchlistSessions<S> {
    /// `store_for` builds the store a given chat's watchlist lives in
    pub fn new<F>(store_for: F) -> Self
    where
        F: Fn(i64) -> WatchlistStore<S> + Send + Sync + 'static,
    {
        Self {
            sessions: Mutex::new(HashMap::new()),
            store_for: Box::new(store_for),
        }
    }

    /// Whether the chat's watchlist is already in memory
    pub fn is_loaded(&self, chat_id: i64) -> bool {
        self.sessions.lock().contains_key(&chat_id)
    }

    /// The chat's watchlist, loading it from the store on first use
    pub async fn get_or_load(&self, chat_id: i64) -> LoadedWatchlist {
        if let Some(watchlist) = self.sessions.lock().get(&chat_id).cloned() {
            return LoadedWatchlist {
                watchlist,
                load_error: None,
            };
        }

        let store = (self.store_for)(chat_id);
        let (loaded, load_error) = match store.try_load().await {
            Ok(watchlist) => (watchlist, None),
            Err(e) => {
                error_logging::log_persistence_error(&e, "load", chat_id, None);
                (Watchlist::new(), Some(e))
            }
        };

        // Another handler may have loaded the same chat in the meantime
        let watchlist = self
            .sessions
            .lock()
            .entry(chat_id)
            .or_insert(loaded)
            .clone();

        debug!(chat_id = %chat_id, entries = watchlist.len(), "Watchlist session ready");
        LoadedWatchlist {
            watchlist,
            load_error,
        }
    }

    /// Add `term` to the front of the chat's watchlist and save it
    pub async fn add(&self, chat_id: i64, term: &str) -> AppResult<Mutation> {
        self.get_or_load(chat_id).await;

        let (entry, snapshot) = {
            let mut sessions = self.sessions.lock();
            let watchlist = sessions.entry(chat_id).or_default();
            let entry = watchlist.add(term)?.to_string();
            (entry, watchlist.clone())
        };

        observability::record_watchlist_mutation(WatchlistAction::Add, snapshot.len());
        Ok(self.persist(chat_id, entry, snapshot).await)
    }

    /// Remove the entry at `index` (0-based) and save the watchlist
    pub async fn remove(&self, chat_id: i64, index: usize) -> AppResult<Mutation> {
        self.get_or_load(chat_id).await;

        let (entry, snapshot) = {
            let mut sessions = self.sessions.lock();
            let watchlist = sessions.entry(chat_id).or_default();
            let entry = watchlist.remove(index)?;
            (entry, watchlist.clone())
        };

        observability::record_watchlist_mutation(WatchlistAction::Remove, snapshot.len());
        Ok(self.persist(chat_id, entry, snapshot).await)
    }

    /// Remove the entry at `index` only if `still_there` accepts it.
    ///
    /// Returns `Ok(None)` when the position no longer exists or now holds a
    /// different entry; the check and the removal happen under one lock.
    pub async fn remove_if<F>(
        &self,
        chat_id: i64,
        index: usize,
        still_there: F,
    ) -> AppResult<Option<Mutation>>
    where
        F: FnOnce(&str) -> bool,
    {
        self.get_or_load(chat_id).await;

        let removed = {
            let mut sessions = self.sessions.lock();
            let watchlist = sessions.entry(chat_id).or_default();
            let matches = watchlist
                .entries()
                .get(index)
                .is_some_and(|entry| still_there(entry.as_str()));
            if matches {
                let entry = watchlist.remove(index)?;
                Some((entry, watchlist.clone()))
            } else {
                None
            }
        };

        let Some((entry, snapshot)) = removed else {
            debug!(chat_id = %chat_id, index = index, "Stale remove request ignored");
            return Ok(None);
        };

        observability::record_watchlist_mutation(WatchlistAction::Remove, snapshot.len());
        Ok(Some(self.persist(chat_id, entry, snapshot).await))
    }

    async fn persist(&self, chat_id: i64, entry: String, watchlist: Watchlist) -> Mutation {
        let store = (self.store_for)(chat_id);
        let save_error = match store.save(&watchlist).await {
            Ok(()) => None,
            Err(e) => {
                error_logging::log_persistence_error(&e, "save", chat_id, Some(watchlist.len()));
                warn!(chat_id = %chat_id, "Keeping unsaved watchlist in memory");
                Some(e)
            }
        };

        Mutation {
            entry,
            watchlist,
            save_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryKeyValueStore;

    fn sessions_over(kv: MemoryKeyValueStore) -> WatchlistSessions<MemoryKeyValueStore> {
        WatchlistSessions::new(move |chat_id| {
            WatchlistStore::with_key(kv.clone(), format!("{}:my-watchlist", chat_id))
        })
    }

    #[tokio::test]
    async fn test_chats_are_isolated() {
        let kv = MemoryKeyValueStore::new();
        let sessions = sessions_over(kv.clone());

        sessions.add(1, "Sugar").await.unwrap();
        sessions.add(2, "MSG").await.unwrap();

        assert_eq!(kv.raw("1:my-watchlist").as_deref(), Some(r#"["Sugar"]"#));
        assert_eq!(kv.raw("2:my-watchlist").as_deref(), Some(r#"["MSG"]"#));
    }

    #[tokio::test]
    async fn test_validation_error_leaves_store_untouched() {
        let kv = MemoryKeyValueStore::new();
        let sessions = sessions_over(kv.clone());

        assert!(matches!(sessions.add(1, "  ").await, Err(AppError::Validation(_))));
        assert!(matches!(sessions.remove(1, 0).await, Err(AppError::Validation(_))));
        assert_eq!(kv.raw("1:my-watchlist"), None);
    }
}
