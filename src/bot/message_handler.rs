//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use teloxide::prelude::*;
use tracing::{debug, error, info, warn, Instrument};

use crate::dialogue::{WatchlistDialogue, WatchlistDialogueState};
use crate::localization::t_lang;
use crate::observability::{self, UserAction};
use crate::scanner::ScanError;
use crate::validation::is_barcode_input;

use super::command_handlers::{
    add_term, handle_add_command, handle_aliases_command, handle_help_command,
    handle_remove_command, handle_start_command, handle_watchlist_command, load_watchlist,
};
use super::ui_builder::format_scan_report;
use super::BotDeps;

/// A slash command and whatever follows it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand<'a> {
    pub name: String,
    pub args: &'a str,
}

/// Split "/Add@my_bot  Palm Oil" into ("add", "Palm Oil")
pub fn parse_command(text: &str) -> Option<ParsedCommand<'_>> {
    let rest = text.trim_start().strip_prefix('/')?;
    let (head, args) = match rest.find(char::is_whitespace) {
        Some(pos) => (&rest[..pos], rest[pos..].trim()),
        None => (rest, ""),
    };
    let name = head.split('@').next().unwrap_or(head).to_lowercase();
    if name.is_empty() {
        return None;
    }
    Some(ParsedCommand { name, args })
}

/// Entry point for every message update
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    deps: BotDeps,
    dialogue: WatchlistDialogue,
) -> Result<()> {
    let span = observability::telegram_span(
        "message_handler",
        msg.from.as_ref().map(|user| user.id.0 as i64),
    );

    async move {
        let language_code = msg
            .from
            .as_ref()
            .and_then(|user| user.language_code.clone());
        let language_code = language_code.as_deref();

        if let Some(text) = msg.text() {
            observability::record_telegram_message("text");
            handle_text_message(&bot, &msg, &deps, &dialogue, text, language_code).await
        } else {
            let message_type = if msg.photo().is_some() {
                "photo"
            } else if msg.document().is_some() {
                "document"
            } else {
                "other"
            };
            observability::record_telegram_message(message_type);
            debug!(chat_id = %msg.chat.id, message_type = %message_type, "Unsupported message");
            bot.send_message(
                msg.chat.id,
                t_lang(&deps.localization, "unsupported-message", language_code),
            )
            .await?;
            Ok(())
        }
    }
    .instrument(span)
    .await
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    deps: &BotDeps,
    dialogue: &WatchlistDialogue,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let state = dialogue.get().await?.unwrap_or_default();

    if let Some(command) = parse_command(text) {
        // Any command abandons a pending /add
        if state != WatchlistDialogueState::Start {
            dialogue.exit().await?;
        }
        return handle_command(bot, msg, deps, dialogue, &command, language_code).await;
    }

    if let WatchlistDialogueState::WaitingForTerm {
        language_code: dialogue_language,
    } = state
    {
        dialogue.exit().await?;
        let language_code = dialogue_language.as_deref().or(language_code);
        if let Some(user) = msg.from.as_ref() {
            observability::record_user_engagement_metrics(
                user.id.0 as i64,
                UserAction::AddTerm,
                language_code,
            );
        }
        return add_term(bot, msg.chat.id, deps, text, language_code).await;
    }

    if is_barcode_input(text) {
        return handle_scan(bot, msg, deps, text, language_code).await;
    }

    debug!(
        chat_id = %msg.chat.id,
        digits = text.chars().filter(char::is_ascii_digit).count(),
        chars = text.trim().chars().count(),
        "Text is not a barcode"
    );
    bot.send_message(
        msg.chat.id,
        t_lang(&deps.localization, "scan-invalid", language_code),
    )
    .await?;
    Ok(())
}

async fn handle_command(
    bot: &Bot,
    msg: &Message,
    deps: &BotDeps,
    dialogue: &WatchlistDialogue,
    command: &ParsedCommand<'_>,
    language_code: Option<&str>,
) -> Result<()> {
    debug!(chat_id = %msg.chat.id, command = %command.name, "Handling command");

    match command.name.as_str() {
        "start" => handle_start_command(bot, msg, deps, language_code).await,
        "help" => handle_help_command(bot, msg, deps, language_code).await,
        "watchlist" | "list" => handle_watchlist_command(bot, msg, deps, language_code).await,
        "add" => handle_add_command(bot, msg, deps, dialogue, command.args, language_code).await,
        "remove" => handle_remove_command(bot, msg, deps, command.args, language_code).await,
        "aliases" => handle_aliases_command(bot, msg, deps, language_code).await,
        "cancel" => {
            bot.send_message(msg.chat.id, t_lang(&deps.localization, "cancel", language_code))
                .await?;
            Ok(())
        }
        _ => handle_help_command(bot, msg, deps, language_code).await,
    }
}

/// Claim the chat's scan slot and run the lookup in the background.
///
/// The handler returns as soon as the lookup is started, so the chat can
/// keep using the bot; a second barcode before the first resolves is
/// refused with the busy message.
async fn handle_scan(
    bot: &Bot,
    msg: &Message,
    deps: &BotDeps,
    text: &str,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let localization = &deps.localization;

    if let Some(user) = msg.from.as_ref() {
        observability::record_user_engagement_metrics(user.id.0 as i64, UserAction::Scan, language_code);
    }

    let prepared = match deps.scanner.prepare(chat_id.0, text) {
        Ok(prepared) => prepared,
        Err(ScanError::Busy) => {
            bot.send_message(chat_id, t_lang(localization, "scan-busy", language_code))
                .await?;
            return Ok(());
        }
        Err(e) => {
            debug!(chat_id = %chat_id, error = %e, "Scan input rejected");
            bot.send_message(chat_id, t_lang(localization, "scan-invalid", language_code))
                .await?;
            return Ok(());
        }
    };

    let watchlist = load_watchlist(bot, chat_id, deps, language_code).await?;
    bot.send_message(chat_id, t_lang(localization, "scan-fetching", language_code))
        .await?;
    info!(chat_id = %chat_id, barcode = %prepared.barcode(), "Scan started");

    let bot = bot.clone();
    let deps = deps.clone();
    let language_code = language_code.map(str::to_string);
    tokio::spawn(async move {
        let language_code = language_code.as_deref();
        let barcode = prepared.barcode().to_string();

        let reply = match deps.scanner.run(prepared, &watchlist).await {
            Ok(report) => format_scan_report(&report, &deps.localization, language_code),
            Err(ScanError::Lookup(e)) if e.is_not_found() => {
                t_lang(&deps.localization, "scan-not-found", language_code)
            }
            Err(e) => {
                warn!(chat_id = %chat_id, barcode = %barcode, error = %e, "Scan failed");
                format!("❌ {}", t_lang(&deps.localization, "scan-error", language_code))
            }
        };

        if let Err(e) = bot.send_message(chat_id, reply).await {
            error!(chat_id = %chat_id, error = %e, "Failed to send scan result");
        }
    });

    Ok(())
}
