//! # Product Records
//!
//! The product data the matcher and the bot consume, and the mapping from
//! an Open Food Facts v2 product response onto it.
//!
//! Missing or empty fields never fail a lookup; they fall back to fixed
//! defaults so the result can still be shown and matched:
//!
//! | field              | default                    |
//! |--------------------|----------------------------|
//! | `product_name`     | `Name not found`           |
//! | `image_front_url`  | no image                   |
//! | `nova_group`       | [`NovaScore::Unknown`]     |
//! | `ingredients_text` | `No ingredients listed.`   |

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::errors::LookupError;

pub const DEFAULT_PRODUCT_NAME: &str = "Name not found";
pub const DEFAULT_INGREDIENTS_TEXT: &str = "No ingredients listed.";

/// NOVA food processing classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NovaScore {
    One,
    Two,
    Three,
    Four,
    Unknown,
}

impl NovaScore {
    /// Read a `nova_group` value, which the API sends as a number or a string
    pub fn from_value(value: Option<&Value>) -> Self {
        let group = match value {
            Some(Value::Number(n)) => n.as_i64(),
            Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        match group {
            Some(1) => NovaScore::One,
            Some(2) => NovaScore::Two,
            Some(3) => NovaScore::Three,
            Some(4) => NovaScore::Four,
            _ => NovaScore::Unknown,
        }
    }

    pub fn as_number(&self) -> Option<u8> {
        match self {
            NovaScore::One => Some(1),
            NovaScore::Two => Some(2),
            NovaScore::Three => Some(3),
            NovaScore::Four => Some(4),
            NovaScore::Unknown => None,
        }
    }

    /// Localization key for the human-readable label
    pub fn label_key(&self) -> &'static str {
        match self {
            NovaScore::One => "nova-1",
            NovaScore::Two => "nova-2",
            NovaScore::Three => "nova-3",
            NovaScore::Four => "nova-4",
            NovaScore::Unknown => "nova-unknown",
        }
    }

    /// Colored marker shown next to the label
    pub fn indicator(&self) -> &'static str {
        match self {
            NovaScore::One => "🟢",
            NovaScore::Two => "🟡",
            NovaScore::Three => "🟠",
            NovaScore::Four => "🔴",
            NovaScore::Unknown => "⚪",
        }
    }
}

impl fmt::Display for NovaScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_number() {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "N/A"),
        }
    }
}

/// A product as returned by the lookup adapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub barcode: String,
    pub product_name: String,
    pub image_url: Option<String>,
    pub nova_score: NovaScore,
    pub ingredients_text: String,
}

impl ProductRecord {
    /// Ingredient text split on commas for display, one item per entry
    pub fn ingredient_items(&self) -> Vec<&str> {
        self.ingredients_text
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Map an Open Food Facts v2 response body onto a record.
    ///
    /// A `status` other than `1`, or a missing `product` object, means the
    /// product is unknown.
    pub fn from_off_response(barcode: &str, body: &str) -> Result<Self, LookupError> {
        let response: OffResponse =
            serde_json::from_str(body).map_err(|e| LookupError::Malformed(e.to_string()))?;

        let found = matches!(response.status.as_ref().and_then(Value::as_i64), Some(1));
        let product = match (found, response.product) {
            (true, Some(product)) => product,
            _ => return Err(LookupError::NotFound(barcode.to_string())),
        };

        Ok(Self {
            barcode: barcode.to_string(),
            product_name: non_empty(product.product_name)
                .unwrap_or_else(|| DEFAULT_PRODUCT_NAME.to_string()),
            image_url: non_empty(product.image_front_url),
            nova_score: NovaScore::from_value(product.nova_group.as_ref()),
            ingredients_text: non_empty(product.ingredients_text)
                .unwrap_or_else(|| DEFAULT_INGREDIENTS_TEXT.to_string()),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct OffResponse {
    #[serde(default)]
    status: Option<Value>,
    #[serde(default)]
    product: Option<OffProduct>,
}

#[derive(Debug, Deserialize)]
struct OffProduct {
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    image_front_url: Option<String>,
    #[serde(default)]
    nova_group: Option<Value>,
    #[serde(default)]
    ingredients_text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_response() {
        let body = json!({
            "code": "3017620422003",
            "status": 1,
            "product": {
                "product_name": "Nutella",
                "image_front_url": "https://images.openfoodfacts.org/nutella.jpg",
                "nova_group": 4,
                "ingredients_text": "Sugar, palm oil, hazelnuts 13%, skimmed milk powder 8.7%"
            }
        })
        .to_string();

        let record = ProductRecord::from_off_response("3017620422003", &body).unwrap();
        assert_eq!(record.product_name, "Nutella");
        assert_eq!(record.nova_score, NovaScore::Four);
        assert_eq!(
            record.image_url.as_deref(),
            Some("https://images.openfoodfacts.org/nutella.jpg")
        );
        assert_eq!(record.ingredient_items()[1], "palm oil");
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let body = json!({ "status": 1, "product": { "product_name": "" } }).to_string();
        let record = ProductRecord::from_off_response("96385074", &body).unwrap();

        assert_eq!(record.product_name, DEFAULT_PRODUCT_NAME);
        assert_eq!(record.image_url, None);
        assert_eq!(record.nova_score, NovaScore::Unknown);
        assert_eq!(record.nova_score.to_string(), "N/A");
        assert_eq!(record.ingredients_text, DEFAULT_INGREDIENTS_TEXT);
    }

    #[test]
    fn test_not_found() {
        let body = json!({ "status": 0, "status_verbose": "product not found" }).to_string();
        assert_eq!(
            ProductRecord::from_off_response("00000000", &body),
            Err(LookupError::NotFound("00000000".to_string()))
        );

        let body = json!({ "status": 1 }).to_string();
        assert!(matches!(
            ProductRecord::from_off_response("00000000", &body),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_body() {
        assert!(matches!(
            ProductRecord::from_off_response("00000000", "<html>"),
            Err(LookupError::Malformed(_))
        ));
    }

    #[test]
    fn test_nova_from_string_value() {
        assert_eq!(NovaScore::from_value(Some(&json!("2"))), NovaScore::Two);
        assert_eq!(NovaScore::from_value(Some(&json!(7))), NovaScore::Unknown);
        assert_eq!(NovaScore::from_value(Some(&Value::Null)), NovaScore::Unknown);
        assert_eq!(NovaScore::from_value(None), NovaScore::Unknown);
    }
}
