//! Validation module for user input
//!
//! Reusable validation functions for:
//!
//! - Watchlist terms
//! - 1-based list positions typed by the user
//! - Scanned barcodes

use lazy_static::lazy_static;
use regex::Regex;

/// Longest watchlist term accepted, in characters
pub const MAX_TERM_LENGTH: usize = 100;

lazy_static! {
    /// EAN-8, UPC-A, EAN-13 and GTIN-14 lengths
    static ref BARCODE_PATTERN: Regex =
        Regex::new(r"^(\d{8}|\d{12}|\d{13}|\d{14})$").expect("Invalid barcode regex pattern");
}

/// Validates a watchlist term
///
/// # Returns
/// * `Ok(&str)` - The trimmed term if valid
/// * `Err(&str)` - Error type: "empty" or "too_long"
///
/// # Examples
/// ```
/// use watchlist_scanner::validation::validate_watchlist_term;
///
/// assert_eq!(validate_watchlist_term("  Palm Oil "), Ok("Palm Oil"));
/// assert_eq!(validate_watchlist_term("   "), Err("empty"));
/// assert_eq!(validate_watchlist_term(&"a".repeat(101)), Err("too_long"));
/// ```
pub fn validate_watchlist_term(term: &str) -> Result<&str, &'static str> {
    let trimmed = term.trim();

    if trimmed.is_empty() {
        return Err("empty");
    }

    if trimmed.chars().count() > MAX_TERM_LENGTH {
        return Err("too_long");
    }

    Ok(trimmed)
}

/// Parse a 1-based position typed by the user into a 0-based index
///
/// # Returns
/// * `Ok(usize)` - The 0-based index
/// * `Err(&str)` - Error type: "not_a_number" or "out_of_range"
pub fn parse_position(input: &str, list_len: usize) -> Result<usize, &'static str> {
    let position: usize = input.trim().parse().map_err(|_| "not_a_number")?;

    if position == 0 || position > list_len {
        return Err("out_of_range");
    }

    Ok(position - 1)
}

/// Normalize raw scanner or chat input into a digit-only barcode.
///
/// Surrounding whitespace, control characters and a byte-order mark are
/// dropped, as are spaces and dashes inside the code ("4 006381 333931").
pub fn normalize_barcode(raw: &str) -> String {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c.is_control() || c == '\u{FEFF}');
    trimmed.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Whether raw input looks like a barcode the user meant to scan.
///
/// Only digits, spaces and dashes may appear, and the digits must form a
/// supported barcode length.
pub fn is_barcode_input(raw: &str) -> bool {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{FEFF}');
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || c == ' ' || c == '-')
    {
        return false;
    }
    is_valid_barcode(&normalize_barcode(trimmed))
}

/// Whether a normalized code has a supported barcode length
pub fn is_valid_barcode(code: &str) -> bool {
    BARCODE_PATTERN.is_match(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_watchlist_term() {
        assert_eq!(validate_watchlist_term("Sugar"), Ok("Sugar"));
        assert_eq!(validate_watchlist_term("\tMSG\n"), Ok("MSG"));
        assert_eq!(validate_watchlist_term(""), Err("empty"));
        assert_eq!(validate_watchlist_term(&"é".repeat(100)).map(|t| t.len()), Ok(200));
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("1", 3), Ok(0));
        assert_eq!(parse_position(" 3 ", 3), Ok(2));
        assert_eq!(parse_position("0", 3), Err("out_of_range"));
        assert_eq!(parse_position("4", 3), Err("out_of_range"));
        assert_eq!(parse_position("two", 3), Err("not_a_number"));
        assert_eq!(parse_position("-1", 3), Err("not_a_number"));
    }

    #[test]
    fn test_normalize_barcode() {
        assert_eq!(normalize_barcode("\u{FEFF} 4006381333931\r\n"), "4006381333931");
        assert_eq!(normalize_barcode("4 006381 333931"), "4006381333931");
        assert_eq!(normalize_barcode("0-12345-67890-5"), "012345678905");
    }

    #[test]
    fn test_barcode_detection() {
        assert!(is_barcode_input("4006381333931"));
        assert!(is_barcode_input("0-12345-67890-5"));
        assert!(is_barcode_input("96385074"));
        assert!(!is_barcode_input("12345"));
        assert!(!is_barcode_input("add sugar"));
        assert!(!is_barcode_input("4006381333931a"));
        assert!(!is_barcode_input(""));
    }
}
