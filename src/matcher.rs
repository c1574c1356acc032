//! # Ingredient Matcher
//!
//! Pure matching of free-text ingredient listings against a watchlist.
//!
//! Every watchlist entry is expanded through the alias table before the
//! text is searched, so "sugar" also catches "dextrose". Matching is plain
//! substring containment on lowercased text: there is no tokenization, and
//! "egg" will match inside "eggplant".

use crate::aliases::{AliasTable, ALIAS_TABLE};
use tracing::trace;

/// Find the watchlist entries present in `ingredients_text`.
///
/// Uses the process-wide alias table. See [`find_matches_with_table`].
pub fn find_matches<S: AsRef<str>>(ingredients_text: &str, watchlist: &[S]) -> Vec<String> {
    find_matches_with_table(&ALIAS_TABLE, ingredients_text, watchlist)
}

/// Find the watchlist entries present in `ingredients_text` using `table`.
///
/// The result keeps watchlist order and original casing. Repeated entries are
/// evaluated independently, so a duplicated entry can be reported twice. An
/// entry is reported once even if several of its synonyms occur.
pub fn find_matches_with_table<S: AsRef<str>>(
    table: &AliasTable,
    ingredients_text: &str,
    watchlist: &[S],
) -> Vec<String> {
    if watchlist.is_empty() {
        return Vec::new();
    }

    let haystack = ingredients_text.to_lowercase();
    if haystack.trim().is_empty() {
        return Vec::new();
    }

    let mut found = Vec::new();
    for entry in watchlist {
        let entry = entry.as_ref();
        let search_terms = table.expand(entry);

        if let Some(term) = search_terms
            .iter()
            .find(|term| !term.is_empty() && haystack.contains(term.as_str()))
        {
            trace!(entry = %entry, matched_term = %term, "Watchlist entry found in ingredients");
            found.push(entry.to_string());
        }
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_watchlist() {
        let empty: [&str; 0] = [];
        assert!(find_matches("sugar, salt", &empty).is_empty());
    }

    #[test]
    fn test_empty_text() {
        assert!(find_matches("", &["sugar"]).is_empty());
        assert!(find_matches("   \n\t", &["sugar", "salt"]).is_empty());
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(find_matches("PALM OIL is bad", &["Palm Oil"]), vec!["Palm Oil"]);
    }

    #[test]
    fn test_alias_resolution() {
        assert_eq!(
            find_matches("contains high fructose corn syrup", &["sugar"]),
            vec!["sugar"]
        );
    }

    #[test]
    fn test_substring_matching_is_preserved() {
        assert_eq!(find_matches("grilled eggplant", &["egg"]), vec!["egg"]);
    }

    #[test]
    fn test_single_report_when_several_synonyms_match() {
        let text = "sugar, dextrose, molasses";
        assert_eq!(find_matches(text, &["Sugar"]), vec!["Sugar"]);
    }

    #[test]
    fn test_custom_table() {
        let table = AliasTable::from_groups(&[("gluten", &["wheat", "barley", "rye"])]);
        let text = "Rolled oats, barley malt";
        assert_eq!(find_matches_with_table(&table, text, &["Gluten"]), vec!["Gluten"]);
        // Not in the custom table, so no alias expansion
        assert!(find_matches_with_table(&table, "dextrose", &["sugar"]).is_empty());
    }
}
