//! Conversation state for multi-step watchlist edits.

use serde::{Deserialize, Serialize};
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Represents the conversation state of a chat
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum WatchlistDialogueState {
    #[default]
    Start,
    /// `/add` was sent without a term; the next text message is the term
    WaitingForTerm { language_code: Option<String> },
}

/// Type alias for our watchlist dialogue
pub type WatchlistDialogue = Dialogue<WatchlistDialogueState, InMemStorage<WatchlistDialogueState>>;
