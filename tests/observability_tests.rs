//! # Observability Tests Module
//!
//! Metrics recording, span creation and observability configuration.

#[cfg(test)]
mod tests {
    use std::time::Duration;
    use watchlist_scanner::observability::{self, UserAction, WatchlistAction};
    use watchlist_scanner::observability_config::{presets, ObservabilityConfig};

    /// Recording functions must be safe to call without an installed recorder
    #[test]
    fn test_metrics_recording_without_recorder() {
        observability::record_telegram_message("text");
        observability::record_telegram_message("photo");

        observability::record_scan_metrics("completed", 2);
        observability::record_scan_metrics("completed", 0);
        observability::record_scan_metrics("not_found", 0);
        observability::record_scan_metrics("busy", 0);

        observability::record_lookup_metrics("found", Duration::from_millis(120));
        observability::record_store_metrics("save", false, Duration::from_millis(3));
        observability::record_db_metrics("upsert", Duration::from_millis(8));
        observability::record_health_check_metrics("database", true, Duration::from_millis(1));

        observability::record_watchlist_mutation(WatchlistAction::Add, 3);
        observability::record_watchlist_mutation(WatchlistAction::Remove, 2);
        observability::record_user_engagement_metrics(12345, UserAction::Scan, Some("fr"));
        observability::record_user_engagement_metrics(12345, UserAction::AliasesCommand, None);
    }

    #[test]
    fn test_span_names() {
        let scan_span = observability::scan_span("4006381333931", 12345);
        assert_eq!(scan_span.metadata().unwrap().name(), "scan_operation");

        let db_span = observability::db_span("select", "kv_store");
        assert_eq!(db_span.metadata().unwrap().name(), "db_operation");

        let telegram_span = observability::telegram_span("message_handler", Some(12345));
        assert_eq!(telegram_span.metadata().unwrap().name(), "telegram_operation");
    }

    #[test]
    fn test_presets_are_valid() {
        let dev = presets::development();
        assert!(dev.is_development());
        assert!(dev.use_pretty_logs());
        assert!(dev.validate().is_ok());

        let prod = presets::production();
        assert!(prod.is_production());
        assert!(!prod.use_pretty_logs());
        assert!(prod.enable_trace_sampling);
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_https_otlp_endpoint_accepted() {
        let config = ObservabilityConfig {
            otlp_endpoint: Some("https://collector.internal:4317".to_string()),
            ..presets::production()
        };
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_readiness_without_database() {
        assert!(observability::perform_readiness_checks(None).await.is_ok());
    }
}
