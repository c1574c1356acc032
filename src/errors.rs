//! # Application Error Types
//!
//! This module defines the error types used throughout the watchlist scanner.
//! `AppError` covers the application as a whole, `LookupError` describes the
//! ways a product lookup can fail before the matcher ever runs.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Validation errors (watchlist terms, positions, barcodes)
    Validation(String),
    /// Database operation errors
    Database(String),
    /// Product lookup errors (not found, malformed response)
    Lookup(String),
    /// Network/communication errors
    Network(String),
    /// Watchlist encode/decode and store errors
    Persistence(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::Validation(msg) => write!(f, "[VALIDATION] {}", msg),
            AppError::Database(msg) => write!(f, "[DATABASE] {}", msg),
            AppError::Lookup(msg) => write!(f, "[LOOKUP] {}", msg),
            AppError::Network(msg) => write!(f, "[NETWORK] {}", msg),
            AppError::Persistence(msg) => write!(f, "[PERSISTENCE] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Persistence(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<LookupError> for AppError {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Transport(_) | LookupError::HttpStatus(_) => {
                AppError::Network(err.to_string())
            }
            LookupError::InvalidBarcode(_) => AppError::Validation(err.to_string()),
            LookupError::NotFound(_) | LookupError::Malformed(_) => {
                AppError::Lookup(err.to_string())
            }
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Ways a product lookup can fail
#[derive(Debug, Clone, PartialEq)]
pub enum LookupError {
    /// The scanned code is not a usable barcode
    InvalidBarcode(String),
    /// The database answered but has no product for this code
    NotFound(String),
    /// The response body could not be understood
    Malformed(String),
    /// The request never produced a response
    Transport(String),
    /// The server answered with an unexpected status
    HttpStatus(u16),
}

impl LookupError {
    /// Whether this failure should be reported as "product not found"
    /// rather than as a fetch error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound(_) | LookupError::Malformed(_))
    }
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::InvalidBarcode(code) => {
                write!(f, "[LOOKUP_BARCODE] Not a valid barcode: {}", code)
            }
            LookupError::NotFound(code) => {
                write!(f, "[LOOKUP_NOT_FOUND] No product found for barcode {}", code)
            }
            LookupError::Malformed(msg) => {
                write!(f, "[LOOKUP_MALFORMED] Product response could not be parsed: {}", msg)
            }
            LookupError::Transport(msg) => {
                write!(f, "[LOOKUP_TRANSPORT] Product request failed: {}", msg)
            }
            LookupError::HttpStatus(status) => {
                write!(f, "[LOOKUP_STATUS] Product service returned HTTP {}", status)
            }
        }
    }
}

impl std::error::Error for LookupError {}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            LookupError::Malformed(err.to_string())
        } else {
            LookupError::Transport(err.to_string())
        }
    }
}

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log database operation errors with contextual information
    pub fn log_database_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: Option<i64>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            chat_id = ?chat_id,
            "Database operation failed"
        );
    }

    /// Log product lookup errors with the barcode that was scanned
    pub fn log_lookup_error(
        error: &impl std::fmt::Display,
        barcode: &str,
        endpoint: Option<&str>,
    ) {
        error!(
            error = %error,
            barcode = %barcode,
            endpoint = ?endpoint,
            "Product lookup failed"
        );
    }

    /// Log watchlist persistence errors
    pub fn log_persistence_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: i64,
        entry_count: Option<usize>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            chat_id = %chat_id,
            entry_count = ?entry_count,
            "Watchlist persistence failed"
        );
    }

    /// Log validation errors with input context
    pub fn log_validation_error(
        error: &impl std::fmt::Display,
        operation: &str,
        chat_id: Option<i64>,
        input_type: &str,
        input_value: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            chat_id = ?chat_id,
            input_type = %input_type,
            input_value = ?input_value.map(|v| if v.chars().count() > 100 {
                format!("{}...", v.chars().take(100).collect::<String>())
            } else {
                v.to_string()
            }),
            "Validation failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display_tags() {
        assert_eq!(
            AppError::Persistence("bad json".to_string()).to_string(),
            "[PERSISTENCE] bad json"
        );
        assert!(AppError::Lookup("x".to_string()).to_string().starts_with("[LOOKUP]"));
    }

    #[test]
    fn test_lookup_error_classification() {
        assert!(LookupError::NotFound("123".to_string()).is_not_found());
        assert!(LookupError::Malformed("eof".to_string()).is_not_found());
        assert!(!LookupError::Transport("refused".to_string()).is_not_found());
        assert!(!LookupError::HttpStatus(503).is_not_found());
    }

    #[test]
    fn test_lookup_error_into_app_error() {
        let err: AppError = LookupError::HttpStatus(500).into();
        assert!(matches!(err, AppError::Network(_)));

        let err: AppError = LookupError::NotFound("4006381333931".to_string()).into();
        assert!(matches!(err, AppError::Lookup(_)));

        let err: AppError = LookupError::InvalidBarcode("abc".to_string()).into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
