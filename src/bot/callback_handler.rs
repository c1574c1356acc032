//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::types::MaybeInaccessibleMessage;
use tracing::{debug, Instrument};

use crate::localization::{t_args_lang, t_lang};
use crate::observability::{self, UserAction};

use super::command_handlers::{load_watchlist, report_mutation, send_watchlist};
use super::ui_builder::{parse_remove_callback, RemoveButton};
use super::BotDeps;

/// Handle callback queries from inline keyboards
pub async fn callback_handler(bot: Bot, q: CallbackQuery, deps: BotDeps) -> Result<()> {
    let span = observability::telegram_span("callback_handler", Some(q.from.id.0 as i64));

    async move {
        observability::record_telegram_message("callback");

        // Stop the client's loading spinner whatever happens next
        bot.answer_callback_query(q.id.clone()).await?;

        let chat_id = match &q.message {
            Some(MaybeInaccessibleMessage::Regular(msg)) => msg.chat.id,
            Some(MaybeInaccessibleMessage::Inaccessible(msg)) => msg.chat.id,
            None => ChatId::from(q.from.id),
        };
        let language_code = q.from.language_code.as_deref();
        let data = q.data.as_deref().unwrap_or("");

        match parse_remove_callback(data) {
            Some(button) => handle_remove_callback(&bot, chat_id, &deps, button, &q, language_code).await,
            None => {
                debug!(chat_id = %chat_id, data = %data, "Ignoring unknown callback data");
                Ok(())
            }
        }
    }
    .instrument(span)
    .await
}

async fn handle_remove_callback(
    bot: &Bot,
    chat_id: ChatId,
    deps: &BotDeps,
    button: RemoveButton,
    q: &CallbackQuery,
    language_code: Option<&str>,
) -> Result<()> {
    load_watchlist(bot, chat_id, deps, language_code).await?;

    // The keyboard may be older than the list it points into
    let removed = deps
        .sessions
        .remove_if(chat_id.0, button.index, |entry| button.matches_entry(entry))
        .await?;

    match removed {
        Some(mutation) => {
            observability::record_user_engagement_metrics(
                q.from.id.0 as i64,
                UserAction::RemoveTerm,
                language_code,
            );
            let confirmation = t_args_lang(
                &deps.localization,
                "remove-success",
                &[("term", mutation.entry.as_str())],
                language_code,
            );
            report_mutation(bot, chat_id, deps, mutation, confirmation, language_code).await
        }
        None => {
            bot.send_message(
                chat_id,
                t_lang(&deps.localization, "remove-button-expired", language_code),
            )
            .await?;
            let current = deps.sessions.get_or_load(chat_id.0).await;
            send_watchlist(bot, chat_id, deps, &current.watchlist, language_code).await
        }
    }
}
