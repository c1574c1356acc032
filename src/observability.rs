//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Structured logging with configurable levels and formats
//! - Metrics collection and Prometheus export
//! - Optional OpenTelemetry trace export
//! - Health check endpoints for monitoring

pub mod health_checks;
pub mod metrics;
pub mod tracing_mod;

use std::sync::Arc;

use anyhow::Result;
use sqlx::PgPool;

use crate::observability_config::ObservabilityConfig;

pub use self::health_checks::{check_database_health, perform_readiness_checks};
pub use self::metrics::{
    record_db_metrics, record_health_check_metrics, record_lookup_metrics, record_scan_metrics,
    record_store_metrics, record_telegram_message, record_user_engagement_metrics,
    record_watchlist_mutation, UserAction, WatchlistAction,
};
pub use self::tracing_mod::{db_span, scan_span, telegram_span};

/// Initialize the complete observability stack from environment configuration
pub async fn init_observability(db_pool: Option<Arc<PgPool>>) -> Result<()> {
    init_observability_with_config(ObservabilityConfig::from_env(), db_pool).await
}

/// Initialize the complete observability stack with custom configuration
pub async fn init_observability_with_config(
    config: ObservabilityConfig,
    db_pool: Option<Arc<PgPool>>,
) -> Result<()> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    tracing_mod::init_tracing_with_config(&config)?;
    tracing_mod::init_opentelemetry_tracing_with_config(&config).await?;

    if config.enable_metrics_export {
        let handle = self::metrics::init_metrics_with_config(&config)?;
        self::metrics::start_metrics_server(handle, config.metrics_port, db_pool.clone()).await?;
    }

    tracing::info!(
        environment = %config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_port = %config.metrics_port,
        has_db_pool = %db_pool.is_some(),
        "Observability stack initialized successfully"
    );
    Ok(())
}
