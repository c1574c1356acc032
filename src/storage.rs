//! # Key-Value Storage
//!
//! The persistence primitive the watchlist is written through: a handful of
//! named string records, read and overwritten whole. The PostgreSQL-backed
//! implementation lives in [`crate::db`]; [`MemoryKeyValueStore`] keeps
//! everything in process and can be told to fail, which is what the tests
//! use.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::errors::{AppError, AppResult};

/// Named string records, read and written whole
pub trait KeyValueStore: Send + Sync {
    /// Read a record, `None` when it was never written
    fn get_item(&self, key: &str) -> impl Future<Output = AppResult<Option<String>>> + Send;

    /// Overwrite a record
    fn set_item(&self, key: &str, value: &str) -> impl Future<Output = AppResult<()>> + Send;
}

/// In-process store with switchable failure injection.
///
/// Clones share the same records.
#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    records: Arc<Mutex<HashMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read fail
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Raw access to a record, bypassing failure injection
    pub fn raw(&self, key: &str) -> Option<String> {
        self.records.lock().get(key).cloned()
    }

    /// Seed a record, bypassing failure injection
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.records.lock().insert(key.to_string(), value.to_string());
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> AppResult<Option<String>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Persistence(format!("read of '{}' failed", key)));
        }
        Ok(self.records.lock().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence(format!("write of '{}' failed", key)));
        }
        self.records.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }
}
