//! Tracing and logging setup module.
//!
//! This module provides:
//! - Structured logging configuration
//! - OpenTelemetry distributed tracing
//! - Tracing span creation utilities

use anyhow::Result;
use opentelemetry::global;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::trace::Sampler;
use tracing_subscriber::prelude::*;

use crate::observability_config::ObservabilityConfig;

/// Initialize structured logging with tracing and configuration
pub fn init_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(format!("watchlist_scanner={}", config.log_level).parse()?)
        .add_directive("sqlx=warn".parse()?)
        .add_directive("teloxide=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    if config.use_pretty_logs() {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_thread_names(false),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .try_init()?;
    }

    tracing::info!(
        environment = %config.environment,
        log_level = %config.log_level,
        "Tracing initialized with structured logging"
    );
    Ok(())
}

/// Initialize OpenTelemetry distributed tracing with configuration
pub async fn init_opentelemetry_tracing_with_config(config: &ObservabilityConfig) -> Result<()> {
    let Some(endpoint) = &config.otlp_endpoint else {
        tracing::info!("OpenTelemetry tracing disabled (no OTLP endpoint configured)");
        return Ok(());
    };

    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .build()?;

    let sampler = if config.enable_trace_sampling {
        Sampler::TraceIdRatioBased(config.trace_sampling_ratio)
    } else {
        Sampler::AlwaysOn
    };

    let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .with_sampler(sampler)
        .build();

    global::set_tracer_provider(tracer_provider);

    tracing::info!(
        otlp_endpoint = %endpoint,
        trace_sampling_enabled = %config.enable_trace_sampling,
        trace_sampling_ratio = %config.trace_sampling_ratio,
        "OpenTelemetry tracing initialized with OTLP export"
    );
    Ok(())
}

/// Create a span for a barcode scan
pub fn scan_span(barcode: &str, session_id: i64) -> tracing::Span {
    tracing::info_span!(
        "scan_operation",
        barcode = barcode,
        session_id = session_id,
        component = "scanner"
    )
}

/// Create a span for database operations
pub fn db_span(operation: &str, table: &str) -> tracing::Span {
    tracing::info_span!(
        "db_operation",
        operation = operation,
        table = table,
        component = "database"
    )
}

/// Create a span for Telegram bot operations
pub fn telegram_span(operation: &str, user_id: Option<i64>) -> tracing::Span {
    tracing::info_span!(
        "telegram_operation",
        operation = operation,
        user_id = user_id,
        component = "telegram"
    )
}
