use anyhow::Result;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::types::ChatId;

use watchlist_scanner::dialogue::{WatchlistDialogue, WatchlistDialogueState};

/// A bare /add puts the chat into WaitingForTerm until the term arrives
#[tokio::test]
async fn test_waiting_for_term_transition() -> Result<()> {
    let storage = InMemStorage::<WatchlistDialogueState>::new();
    let dialogue = WatchlistDialogue::new(storage.clone(), ChatId(42));

    assert_eq!(dialogue.get().await?, None);
    assert_eq!(dialogue.get_or_default().await?, WatchlistDialogueState::Start);

    dialogue
        .update(WatchlistDialogueState::WaitingForTerm {
            language_code: Some("fr".to_string()),
        })
        .await?;

    match dialogue.get().await? {
        Some(WatchlistDialogueState::WaitingForTerm { language_code }) => {
            assert_eq!(language_code.as_deref(), Some("fr"));
        }
        other => panic!("Unexpected dialogue state: {:?}", other),
    }

    // Other chats keep their own state
    let other = WatchlistDialogue::new(storage, ChatId(43));
    assert_eq!(other.get().await?, None);

    dialogue.exit().await?;
    assert_eq!(dialogue.get().await?, None);
    Ok(())
}

#[test]
fn test_dialogue_state_serialization() -> Result<()> {
    let state = WatchlistDialogueState::WaitingForTerm {
        language_code: None,
    };
    let json = serde_json::to_string(&state)?;
    let restored: WatchlistDialogueState = serde_json::from_str(&json)?;
    assert_eq!(restored, state);
    Ok(())
}
