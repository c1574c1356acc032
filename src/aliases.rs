//! # Alias Table
//!
//! Static mapping from a canonical watchlist term to the synonyms that name
//! the same substance on an ingredient label. A user who watches "sugar"
//! should be warned about "dextrose" and "high fructose corn syrup" too.
//!
//! Keys and synonyms are lowercase. Every group lists its own key as the
//! first synonym, so the key itself is always searched verbatim.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Built-in alias groups, in display order.
const DEFAULT_ALIAS_GROUPS: &[(&str, &[&str])] = &[
    (
        "palm oil",
        &[
            "palm oil",
            "palmolein",
            "palm kernel",
            "palm fruit",
            "palmitate",
            "elaeis guineensis",
        ],
    ),
    (
        "sugar",
        &[
            "sugar",
            "high fructose corn syrup",
            "corn syrup",
            "dextrose",
            "fructose",
            "sucrose",
            "maltose",
            "cane juice",
            "molasses",
        ],
    ),
    (
        "msg",
        &[
            "msg",
            "monosodium glutamate",
            "yeast extract",
            "glutamate",
            "hydrolyzed vegetable protein",
        ],
    ),
    ("aspartame", &["aspartame", "nutrasweet", "equal", "e951"]),
];

lazy_static! {
    /// Process-wide alias table, built once on first use
    pub static ref ALIAS_TABLE: AliasTable = AliasTable::from_groups(DEFAULT_ALIAS_GROUPS);
}

/// Immutable lookup from canonical term to its synonym list
#[derive(Debug, Clone)]
pub struct AliasTable {
    groups: HashMap<String, Vec<String>>,
    key_order: Vec<String>,
}

impl AliasTable {
    /// Build a table from `(key, synonyms)` pairs.
    ///
    /// Keys and synonyms are lowercased; the key is prepended to its
    /// synonym list when a group omits it.
    pub fn from_groups(groups: &[(&str, &[&str])]) -> Self {
        let mut map = HashMap::with_capacity(groups.len());
        let mut key_order = Vec::with_capacity(groups.len());

        for (key, synonyms) in groups {
            let key = key.to_lowercase();
            let mut terms: Vec<String> = Vec::with_capacity(synonyms.len() + 1);
            for synonym in synonyms.iter() {
                let synonym = synonym.to_lowercase();
                if !terms.contains(&synonym) {
                    terms.push(synonym);
                }
            }
            if !terms.contains(&key) {
                terms.insert(0, key.clone());
            }

            if !map.contains_key(&key) {
                key_order.push(key.clone());
            }
            map.insert(key, terms);
        }

        Self {
            groups: map,
            key_order,
        }
    }

    /// Expand a watchlist term into every string that should be searched for.
    ///
    /// The term is lowercased first. An exact key match returns the whole
    /// group; anything else comes back as a single lowercased term.
    pub fn expand(&self, term: &str) -> Vec<String> {
        let lowered = term.to_lowercase();
        match self.groups.get(&lowered) {
            Some(synonyms) => synonyms.clone(),
            None => vec![lowered],
        }
    }

    /// Whether `term` (case-insensitively) names an alias group
    pub fn is_alias_key(&self, term: &str) -> bool {
        self.groups.contains_key(&term.to_lowercase())
    }

    /// Canonical keys in the order they were declared
    pub fn keys(&self) -> &[String] {
        &self.key_order
    }

    /// Synonyms for a canonical key, if it has a group
    pub fn synonyms(&self, key: &str) -> Option<&[String]> {
        self.groups.get(&key.to_lowercase()).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Expand a term through the process-wide alias table
pub fn expand(term: &str) -> Vec<String> {
    ALIAS_TABLE.expand(term)
}
