//! # Observability Configuration
//!
//! Environment-specific settings for logging, metrics and trace export.

use std::env;

/// Observability configuration for different environments
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// OTLP endpoint for trace export
    pub otlp_endpoint: Option<String>,
    /// Prometheus metrics endpoint port
    pub metrics_port: u16,
    /// Log level for this crate
    pub log_level: String,
    /// "pretty" or "json"; development always logs pretty
    pub log_format: String,
    /// Whether to enable trace sampling
    pub enable_trace_sampling: bool,
    /// Trace sampling ratio (0.0-1.0)
    pub trace_sampling_ratio: f64,
    /// Whether to serve metrics for Prometheus
    pub enable_metrics_export: bool,
    /// Global labels attached to every metric
    pub tags: Vec<(String, String)>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            otlp_endpoint: None,
            metrics_port: 9090,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            enable_trace_sampling: false,
            trace_sampling_ratio: 1.0,
            enable_metrics_export: true,
            tags: Vec::new(),
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self {
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok(),
            metrics_port: env::var("METRICS_PORT")
                .unwrap_or_else(|_| "9090".to_string())
                .parse()
                .unwrap_or(9090),
            log_level: env::var("OBSERVABILITY_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()),
            enable_trace_sampling: env::var("ENABLE_TRACE_SAMPLING")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
            trace_sampling_ratio: env::var("TRACE_SAMPLING_RATIO")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()
                .unwrap_or(1.0),
            enable_metrics_export: env::var("ENABLE_METRICS_EXPORT")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .unwrap_or(true),
            tags: env::var("OBSERVABILITY_TAGS")
                .map(|tags| parse_tags(&tags))
                .unwrap_or_default(),
        };
        config.add_default_tags();
        config
    }

    fn add_default_tags(&mut self) {
        self.tags.push(("environment".to_string(), self.environment.clone()));
        self.tags.push(("service".to_string(), "watchlist-scanner".to_string()));
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Whether logs should be human-readable rather than JSON
    pub fn use_pretty_logs(&self) -> bool {
        self.is_development() || self.log_format == "pretty"
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if let Some(endpoint) = &self.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid OTLP endpoint format: {}", endpoint));
            }
        }

        if !(0.0..=1.0).contains(&self.trace_sampling_ratio) {
            return Err(format!("Invalid trace sampling ratio: {}", self.trace_sampling_ratio));
        }

        if self.metrics_port == 0 {
            return Err(format!("Invalid metrics port: {}", self.metrics_port));
        }

        if self.log_format != "json" && self.log_format != "pretty" {
            return Err(format!("Invalid log format: {}", self.log_format));
        }

        Ok(())
    }
}

/// Parse tags from environment variable string
/// Format: "key1=value1,key2=value2,key3=value3"
fn parse_tags(tags_str: &str) -> Vec<(String, String)> {
    tags_str
        .split(',')
        .filter_map(|pair| {
            let mut parts = pair.splitn(2, '=');
            match (parts.next(), parts.next()) {
                (Some(key), Some(value)) if !key.trim().is_empty() => {
                    Some((key.trim().to_string(), value.trim().to_string()))
                }
                _ => None,
            }
        })
        .collect()
}

/// Environment-specific configuration presets
pub mod presets {
    use super::ObservabilityConfig;

    /// Development configuration with full observability
    pub fn development() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            log_format: "pretty".to_string(),
            ..Default::default()
        }
    }

    /// Production configuration with sampled traces
    pub fn production() -> ObservabilityConfig {
        ObservabilityConfig {
            environment: "production".to_string(),
            enable_trace_sampling: true,
            trace_sampling_ratio: 0.1,
            log_level: "info".to_string(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ObservabilityConfig::default();
        assert_eq!(config.environment, "development");
        assert_eq!(config.metrics_port, 9090);
        assert!(config.use_pretty_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ObservabilityConfig::default();

        config.otlp_endpoint = Some("invalid-endpoint".to_string());
        assert!(config.validate().is_err());

        config.otlp_endpoint = None;
        config.trace_sampling_ratio = 1.5;
        assert!(config.validate().is_err());

        config.trace_sampling_ratio = 1.0;
        config.log_format = "xml".to_string();
        assert!(config.validate().is_err());

        config.log_format = "json".to_string();
        config.metrics_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tag_parsing() {
        let tags = parse_tags("env=prod, region = eu ,broken,=novalue");
        assert_eq!(
            tags,
            vec![
                ("env".to_string(), "prod".to_string()),
                ("region".to_string(), "eu".to_string()),
            ]
        );
    }

    #[test]
    fn test_presets() {
        let prod = presets::production();
        assert!(prod.is_production());
        assert!(!prod.use_pretty_logs());
        assert_eq!(prod.trace_sampling_ratio, 0.1);

        assert!(presets::development().is_development());
    }
}
