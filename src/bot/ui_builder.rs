//! UI Builder module for creating keyboards and formatting messages

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::aliases::AliasTable;
use crate::localization::{t_args_lang, t_lang, LocalizationManager};
use crate::scanner::ScanReport;
use crate::watchlist::Watchlist;

/// Callback data prefix for the per-entry remove buttons
pub const REMOVE_CALLBACK_PREFIX: &str = "remove:";

/// Format a scan report: alert box first, then the product details
pub fn format_scan_report(
    report: &ScanReport,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    let mut sections = Vec::new();

    if report.is_clear() {
        sections.push(format!(
            "✅ {}\n{}",
            t_lang(localization, "result-all-clear-title", language_code),
            t_lang(localization, "result-all-clear-text", language_code)
        ));
    } else {
        let items = report.matches.join(", ");
        sections.push(format!(
            "⚠️ {}\n{}",
            t_lang(localization, "result-warning-title", language_code),
            t_args_lang(localization, "result-found", &[("items", items.as_str())], language_code)
        ));
    }

    let product = &report.product;
    let mut details = vec![
        format!("🛒 {}", product.product_name),
        format!(
            "{} {}",
            product.nova_score.indicator(),
            t_lang(localization, product.nova_score.label_key(), language_code)
        ),
    ];
    if let Some(url) = &product.image_url {
        details.push(format!(
            "🖼 {}: {}",
            t_lang(localization, "image-link", language_code),
            url
        ));
    }
    sections.push(details.join("\n"));

    let bullets = product
        .ingredient_items()
        .iter()
        .map(|item| format!("• {}", item))
        .collect::<Vec<_>>();
    let ingredients = if bullets.is_empty() {
        product.ingredients_text.clone()
    } else {
        bullets.join("\n")
    };
    sections.push(format!(
        "📋 {}\n{}",
        t_lang(localization, "ingredients-title", language_code),
        ingredients
    ));

    sections.join("\n\n")
}

/// Format the watchlist as a numbered list, newest first
pub fn format_watchlist(
    watchlist: &Watchlist,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    let title = format!("📝 {}", t_lang(localization, "watchlist-title", language_code));

    if watchlist.is_empty() {
        return format!(
            "{}\n\n{}",
            title,
            t_lang(localization, "watchlist-empty", language_code)
        );
    }

    let lines = watchlist
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| format!("{}. {}", i + 1, entry))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\n{}\n\n{}",
        title,
        lines,
        t_lang(localization, "watchlist-hint", language_code)
    )
}

/// One "❌" button per entry, carrying the entry's 0-based index and tag
pub fn create_watchlist_keyboard(watchlist: &Watchlist) -> InlineKeyboardMarkup {
    let buttons = watchlist
        .entries()
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            vec![InlineKeyboardButton::callback(
                format!("❌ {}. {}", i + 1, truncate_label(entry, 30)),
                RemoveButton::for_entry(i, entry).callback_data(),
            )]
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(buttons)
}

/// A remove button: the position it was drawn at and a tag of the entry
/// shown there. Telegram caps callback data at 64 bytes, so the entry itself
/// does not fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveButton {
    pub index: usize,
    pub tag: u32,
}

impl RemoveButton {
    pub fn for_entry(index: usize, entry: &str) -> Self {
        Self {
            index,
            tag: entry_tag(entry),
        }
    }

    /// `remove:<index>:<tag as 8 hex digits>`
    pub fn callback_data(&self) -> String {
        format!("{}{}:{:08x}", REMOVE_CALLBACK_PREFIX, self.index, self.tag)
    }

    /// Whether `entry` is the one this button was drawn for
    pub fn matches_entry(&self, entry: &str) -> bool {
        entry_tag(entry) == self.tag
    }
}

/// Parse `remove:<index>:<tag>` callback data
pub fn parse_remove_callback(data: &str) -> Option<RemoveButton> {
    let (index, tag) = data.strip_prefix(REMOVE_CALLBACK_PREFIX)?.split_once(':')?;
    Some(RemoveButton {
        index: index.parse().ok()?,
        tag: u32::from_str_radix(tag, 16).ok()?,
    })
}

/// 32-bit FNV-1a of the entry, stable across restarts
fn entry_tag(entry: &str) -> u32 {
    entry.bytes().fold(0x811c_9dc5_u32, |hash, byte| {
        (hash ^ u32::from(byte)).wrapping_mul(0x0100_0193)
    })
}

/// Confirmation for an added entry. Naming an alias group adds a note
/// listing the synonyms a scan will also look for.
pub fn format_add_success(
    entry: &str,
    table: &AliasTable,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    let added = t_args_lang(localization, "add-success", &[("term", entry)], language_code);
    if !table.is_alias_key(entry) {
        return added;
    }

    let synonyms = table.synonyms(entry).unwrap_or_default().join(", ");
    format!(
        "{}\n{}",
        added,
        t_args_lang(
            localization,
            "add-alias-note",
            &[("term", entry), ("synonyms", synonyms.as_str())],
            language_code
        )
    )
}

/// List every alias group with its synonyms
pub fn format_aliases(
    table: &AliasTable,
    localization: &LocalizationManager,
    language_code: Option<&str>,
) -> String {
    let groups = table
        .keys()
        .iter()
        .map(|key| {
            let synonyms = table.synonyms(key).unwrap_or_default();
            format!("• {}: {}", key, synonyms.join(", "))
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🔗 {}\n\n{}\n\n{}",
        t_lang(localization, "aliases-title", language_code),
        t_lang(localization, "aliases-description", language_code),
        groups
    )
}

fn truncate_label(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        format!("{}…", text.chars().take(max_chars - 1).collect::<String>())
    }
}
