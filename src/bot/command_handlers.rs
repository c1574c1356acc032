//! Command Handlers module for processing bot commands

use anyhow::Result;
use teloxide::prelude::*;
use tracing::debug;

use crate::aliases::ALIAS_TABLE;
use crate::dialogue::{WatchlistDialogue, WatchlistDialogueState};
use crate::errors::error_logging;
use crate::localization::{t_args_lang, t_lang};
use crate::observability::{self, UserAction};
use crate::session::Mutation;
use crate::validation::{parse_position, validate_watchlist_term, MAX_TERM_LENGTH};
use crate::watchlist::Watchlist;

use super::ui_builder::{
    create_watchlist_keyboard, format_add_success, format_aliases, format_watchlist,
};
use super::BotDeps;

fn record_action(msg: &Message, action: UserAction, language_code: Option<&str>) {
    if let Some(user) = msg.from.as_ref() {
        observability::record_user_engagement_metrics(user.id.0 as i64, action, language_code);
    }
}

/// Handle the /start command
pub async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    deps: &BotDeps,
    language_code: Option<&str>,
) -> Result<()> {
    record_action(msg, UserAction::StartCommand, language_code);

    // Warm the session so a broken store is reported up front
    load_watchlist(bot, msg.chat.id, deps, language_code).await?;

    let localization = &deps.localization;
    let welcome_message = format!(
        "👋 {}\n\n{}\n\n{}",
        t_lang(localization, "welcome-title", language_code),
        t_lang(localization, "welcome-description", language_code),
        t_lang(localization, "welcome-watchlist", language_code)
    );
    bot.send_message(msg.chat.id, welcome_message).await?;
    Ok(())
}

/// Handle the /help command
pub async fn handle_help_command(
    bot: &Bot,
    msg: &Message,
    deps: &BotDeps,
    language_code: Option<&str>,
) -> Result<()> {
    record_action(msg, UserAction::HelpCommand, language_code);

    let localization = &deps.localization;
    let help_message = [
        t_lang(localization, "help-title", language_code),
        t_lang(localization, "help-scan", language_code),
        [
            t_lang(localization, "help-commands", language_code),
            t_lang(localization, "help-watchlist", language_code),
            t_lang(localization, "help-add", language_code),
            t_lang(localization, "help-remove", language_code),
            t_lang(localization, "help-aliases", language_code),
        ]
        .join("\n"),
        t_lang(localization, "help-tip", language_code),
    ]
    .join("\n\n");
    bot.send_message(msg.chat.id, help_message).await?;
    Ok(())
}

/// Handle the /watchlist command
pub async fn handle_watchlist_command(
    bot: &Bot,
    msg: &Message,
    deps: &BotDeps,
    language_code: Option<&str>,
) -> Result<()> {
    record_action(msg, UserAction::WatchlistCommand, language_code);

    let watchlist = load_watchlist(bot, msg.chat.id, deps, language_code).await?;
    send_watchlist(bot, msg.chat.id, deps, &watchlist, language_code).await
}

/// Handle the /add command; without a term, ask for one
pub async fn handle_add_command(
    bot: &Bot,
    msg: &Message,
    deps: &BotDeps,
    dialogue: &WatchlistDialogue,
    args: &str,
    language_code: Option<&str>,
) -> Result<()> {
    if args.trim().is_empty() {
        dialogue
            .update(WatchlistDialogueState::WaitingForTerm {
                language_code: language_code.map(str::to_string),
            })
            .await?;
        bot.send_message(
            msg.chat.id,
            t_lang(&deps.localization, "add-prompt", language_code),
        )
        .await?;
        return Ok(());
    }

    record_action(msg, UserAction::AddTerm, language_code);
    add_term(bot, msg.chat.id, deps, args, language_code).await
}

/// Validate `term`, add it to the chat's watchlist and report the outcome
pub async fn add_term(
    bot: &Bot,
    chat_id: ChatId,
    deps: &BotDeps,
    term: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let localization = &deps.localization;

    if let Err(reason) = validate_watchlist_term(term) {
        error_logging::log_validation_error(&reason, "add_term", Some(chat_id.0), "watchlist_term", Some(term));
        let message = match reason {
            "too_long" => t_args_lang(
                localization,
                "add-error-too-long",
                &[("max", &MAX_TERM_LENGTH.to_string())],
                language_code,
            ),
            _ => t_lang(localization, "add-error-empty", language_code),
        };
        bot.send_message(chat_id, message).await?;
        return Ok(());
    }

    load_watchlist(bot, chat_id, deps, language_code).await?;
    let mutation = deps.sessions.add(chat_id.0, term).await?;
    let confirmation = format_add_success(&mutation.entry, &ALIAS_TABLE, localization, language_code);
    report_mutation(bot, chat_id, deps, mutation, confirmation, language_code).await
}

/// Handle the /remove command with a 1-based position
pub async fn handle_remove_command(
    bot: &Bot,
    msg: &Message,
    deps: &BotDeps,
    args: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let localization = &deps.localization;
    let input = args.trim();

    if input.is_empty() {
        bot.send_message(msg.chat.id, t_lang(localization, "remove-usage", language_code))
            .await?;
        return Ok(());
    }

    let watchlist = load_watchlist(bot, msg.chat.id, deps, language_code).await?;
    let index = match parse_position(input, watchlist.len()) {
        Ok(index) => index,
        Err(reason) => {
            debug!(chat_id = %msg.chat.id, input = %input, reason = %reason, "Rejected /remove position");
            let message = match reason {
                "out_of_range" => t_args_lang(
                    localization,
                    "remove-error-range",
                    &[("input", input), ("count", &watchlist.len().to_string())],
                    language_code,
                ),
                _ => t_args_lang(
                    localization,
                    "remove-error-number",
                    &[("input", input)],
                    language_code,
                ),
            };
            bot.send_message(msg.chat.id, message).await?;
            return Ok(());
        }
    };

    record_action(msg, UserAction::RemoveTerm, language_code);
    let mutation = deps.sessions.remove(msg.chat.id.0, index).await?;
    let confirmation = t_args_lang(
        localization,
        "remove-success",
        &[("term", mutation.entry.as_str())],
        language_code,
    );
    report_mutation(bot, msg.chat.id, deps, mutation, confirmation, language_code).await
}

/// Handle the /aliases command
pub async fn handle_aliases_command(
    bot: &Bot,
    msg: &Message,
    deps: &BotDeps,
    language_code: Option<&str>,
) -> Result<()> {
    record_action(msg, UserAction::AliasesCommand, language_code);
    bot.send_message(
        msg.chat.id,
        format_aliases(&ALIAS_TABLE, &deps.localization, language_code),
    )
    .await?;
    Ok(())
}

/// The chat's watchlist; tells the user when the stored copy could not be read
pub async fn load_watchlist(
    bot: &Bot,
    chat_id: ChatId,
    deps: &BotDeps,
    language_code: Option<&str>,
) -> Result<Watchlist> {
    let loaded = deps.sessions.get_or_load(chat_id.0).await;
    if loaded.load_error.is_some() {
        bot.send_message(
            chat_id,
            format!("⚠️ {}", t_lang(&deps.localization, "error-load-watchlist", language_code)),
        )
        .await?;
    }
    Ok(loaded.watchlist)
}

/// Send the numbered watchlist with its remove buttons
pub async fn send_watchlist(
    bot: &Bot,
    chat_id: ChatId,
    deps: &BotDeps,
    watchlist: &Watchlist,
    language_code: Option<&str>,
) -> Result<()> {
    let text = format_watchlist(watchlist, &deps.localization, language_code);
    if watchlist.is_empty() {
        bot.send_message(chat_id, text).await?;
    } else {
        bot.send_message(chat_id, text)
            .reply_markup(create_watchlist_keyboard(watchlist))
            .await?;
    }
    Ok(())
}

/// Confirm an add or remove, warning when it was not persisted
pub async fn report_mutation(
    bot: &Bot,
    chat_id: ChatId,
    deps: &BotDeps,
    mutation: Mutation,
    confirmation: String,
    language_code: Option<&str>,
) -> Result<()> {
    let localization = &deps.localization;

    if mutation.save_error.is_some() {
        bot.send_message(
            chat_id,
            format!("⚠️ {}", t_lang(localization, "error-save-watchlist", language_code)),
        )
        .await?;
    }

    bot.send_message(chat_id, confirmation).await?;
    send_watchlist(bot, chat_id, deps, &mutation.watchlist, language_code).await
}
