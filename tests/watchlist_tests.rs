use teloxide::types::{InlineKeyboardButtonKind, InlineKeyboardMarkup};
use watchlist_scanner::bot::ui_builder::{create_watchlist_keyboard, parse_remove_callback, RemoveButton};
use watchlist_scanner::errors::AppError;
use watchlist_scanner::session::WatchlistSessions;
use watchlist_scanner::storage::{KeyValueStore, MemoryKeyValueStore};
use watchlist_scanner::watchlist::{Watchlist, WatchlistStore, WATCHLIST_STORAGE_KEY};

fn sessions_over(kv: &MemoryKeyValueStore) -> WatchlistSessions<MemoryKeyValueStore> {
    let kv = kv.clone();
    WatchlistSessions::new(move |_chat_id| WatchlistStore::new(kv.clone()))
}

#[tokio::test]
async fn test_add_then_remove_persists_empty_list() {
    let kv = MemoryKeyValueStore::new();
    let store = WatchlistStore::new(kv.clone());

    let mut watchlist = store.load().await;
    watchlist.add("Sugar").unwrap();
    store.save(&watchlist).await.unwrap();
    assert_eq!(kv.raw(WATCHLIST_STORAGE_KEY).as_deref(), Some(r#"["Sugar"]"#));

    assert_eq!(watchlist.remove(0).unwrap(), "Sugar");
    store.save(&watchlist).await.unwrap();
    assert_eq!(kv.raw(WATCHLIST_STORAGE_KEY).as_deref(), Some("[]"));
}

#[tokio::test]
async fn test_newest_entry_first_and_reload() {
    let kv = MemoryKeyValueStore::new();
    let sessions = sessions_over(&kv);

    sessions.add(1, "Palm Oil").await.unwrap();
    let mutation = sessions.add(1, "  Aspartame ").await.unwrap();
    assert_eq!(mutation.entry, "Aspartame");
    assert_eq!(mutation.watchlist.entries(), ["Aspartame", "Palm Oil"]);
    assert!(mutation.save_error.is_none());

    let reloaded = WatchlistStore::new(kv.clone()).try_load().await.unwrap();
    assert_eq!(reloaded, mutation.watchlist);
}

#[tokio::test]
async fn test_corrupt_record_loads_as_empty() {
    let kv = MemoryKeyValueStore::new();
    kv.insert_raw(WATCHLIST_STORAGE_KEY, "{not json");

    let store = WatchlistStore::new(kv.clone());
    assert!(store.load().await.is_empty());
    assert!(matches!(store.try_load().await, Err(AppError::Persistence(_))));
}

#[tokio::test]
async fn test_missing_record_loads_as_empty() {
    let store = WatchlistStore::new(MemoryKeyValueStore::new());
    assert_eq!(store.try_load().await.unwrap(), Watchlist::new());
}

#[tokio::test]
async fn test_failed_save_keeps_in_memory_watchlist() {
    let kv = MemoryKeyValueStore::new();
    let sessions = sessions_over(&kv);

    sessions.add(5, "MSG").await.unwrap();
    kv.set_fail_writes(true);

    let mutation = sessions.add(5, "Sugar").await.unwrap();
    assert!(mutation.save_error.is_some());
    assert_eq!(mutation.watchlist.entries(), ["Sugar", "MSG"]);

    // The session keeps the unsaved entry, the store still has the old list
    let current = sessions.get_or_load(5).await;
    assert_eq!(current.watchlist.entries(), ["Sugar", "MSG"]);
    assert_eq!(kv.get_item(WATCHLIST_STORAGE_KEY).await.unwrap().as_deref(), Some(r#"["MSG"]"#));

    // The next successful save catches the store up
    kv.set_fail_writes(false);
    sessions.remove(5, 1).await.unwrap();
    assert_eq!(kv.raw(WATCHLIST_STORAGE_KEY).as_deref(), Some(r#"["Sugar"]"#));
}

#[tokio::test]
async fn test_failed_load_reports_once_and_starts_empty() {
    let kv = MemoryKeyValueStore::new();
    kv.insert_raw(WATCHLIST_STORAGE_KEY, r#"["Sugar"]"#);
    kv.set_fail_reads(true);
    let sessions = sessions_over(&kv);

    let first = sessions.get_or_load(9).await;
    assert!(first.load_error.is_some());
    assert!(first.watchlist.is_empty());
    assert!(sessions.is_loaded(9));

    let second = sessions.get_or_load(9).await;
    assert!(second.load_error.is_none());
}

#[tokio::test]
async fn test_invalid_mutations_are_rejected() {
    let kv = MemoryKeyValueStore::new();
    let sessions = sessions_over(&kv);

    assert!(matches!(sessions.add(1, "").await, Err(AppError::Validation(_))));
    assert!(matches!(
        sessions.add(1, &"x".repeat(101)).await,
        Err(AppError::Validation(_))
    ));
    sessions.add(1, &"x".repeat(100)).await.unwrap();
    assert!(matches!(sessions.remove(1, 1).await, Err(AppError::Validation(_))));
}

fn pressed(keyboard: &InlineKeyboardMarkup, row: usize) -> RemoveButton {
    match &keyboard.inline_keyboard[row][0].kind {
        InlineKeyboardButtonKind::CallbackData(data) => parse_remove_callback(data).unwrap(),
        other => panic!("unexpected button kind: {:?}", other),
    }
}

#[tokio::test]
async fn test_old_remove_button_after_add_removes_nothing() {
    let kv = MemoryKeyValueStore::new();
    let sessions = sessions_over(&kv);
    sessions.add(3, "Palm Oil").await.unwrap();
    sessions.add(3, "Sugar").await.unwrap();

    // Keyboard drawn for ["Sugar", "Palm Oil"]
    let shown = sessions.get_or_load(3).await.watchlist;
    let old_keyboard = create_watchlist_keyboard(&shown);

    // An add shifts every entry down one position
    sessions.add(3, "MSG").await.unwrap();

    let sugar = pressed(&old_keyboard, 0);
    let removed = sessions
        .remove_if(3, sugar.index, |entry| sugar.matches_entry(entry))
        .await
        .unwrap();
    assert!(removed.is_none());
    assert_eq!(
        sessions.get_or_load(3).await.watchlist.entries(),
        ["MSG", "Sugar", "Palm Oil"]
    );
    assert_eq!(
        kv.raw(WATCHLIST_STORAGE_KEY).as_deref(),
        Some(r#"["MSG","Sugar","Palm Oil"]"#)
    );

    // A freshly drawn keyboard removes the entry it shows
    let fresh = create_watchlist_keyboard(&sessions.get_or_load(3).await.watchlist);
    let sugar = pressed(&fresh, 1);
    let mutation = sessions
        .remove_if(3, sugar.index, |entry| sugar.matches_entry(entry))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mutation.entry, "Sugar");
    assert_eq!(mutation.watchlist.entries(), ["MSG", "Palm Oil"]);
}

#[tokio::test]
async fn test_remove_button_past_the_end_removes_nothing() {
    let kv = MemoryKeyValueStore::new();
    let sessions = sessions_over(&kv);
    sessions.add(4, "Sugar").await.unwrap();

    let button = RemoveButton::for_entry(2, "Sugar");
    let removed = sessions
        .remove_if(4, button.index, |entry| button.matches_entry(entry))
        .await
        .unwrap();
    assert!(removed.is_none());
    assert_eq!(sessions.get_or_load(4).await.watchlist.entries(), ["Sugar"]);
}
