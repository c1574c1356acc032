//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Prometheus recorder setup
//! - The `/metrics` and `/health/*` HTTP server
//! - Recording functions for scans, lookups, watchlist storage and bot usage

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use hyper::server::conn::http1;
use hyper_util::rt::TokioIo;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sqlx::PgPool;
use tokio::net::TcpListener;

use super::health_checks::perform_readiness_checks;
use crate::observability_config::ObservabilityConfig;

/// Initialize metrics collection with Prometheus exporter and configuration
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<PrometheusHandle> {
    let mut builder = PrometheusBuilder::new();
    for (key, value) in &config.tags {
        builder = builder.add_global_label(key.clone(), value.clone());
    }
    let handle = builder.install_recorder()?;

    tracing::info!(
        metrics_enabled = %config.enable_metrics_export,
        global_labels = config.tags.len(),
        "Metrics collection initialized"
    );
    Ok(handle)
}

/// Serve `/metrics`, `/health/live` and `/health/ready` on `port`
pub async fn start_metrics_server(
    metrics_handle: PrometheusHandle,
    port: u16,
    db_pool: Option<Arc<PgPool>>,
) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Metrics server listening on {}", addr);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((stream, _)) => {
                    let metrics_handle = metrics_handle.clone();
                    let db_pool = db_pool.clone();

                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = hyper::service::service_fn(
                            move |req: hyper::Request<hyper::body::Incoming>| {
                                let metrics_handle = metrics_handle.clone();
                                let db_pool = db_pool.clone();
                                let method = req.method().clone();
                                let path = req.uri().path().to_string();
                                async move {
                                    let response = match (&method, path.as_str()) {
                                        (&hyper::Method::GET, "/metrics") => {
                                            let mut response =
                                                hyper::Response::new(metrics_handle.render());
                                            response.headers_mut().insert(
                                                "content-type",
                                                hyper::header::HeaderValue::from_static(
                                                    "text/plain; version=0.0.4; charset=utf-8",
                                                ),
                                            );
                                            response
                                        }
                                        (&hyper::Method::GET, "/health/live") => {
                                            hyper::Response::new("OK".to_string())
                                        }
                                        (&hyper::Method::GET, "/health/ready") => {
                                            match perform_readiness_checks(db_pool).await {
                                                Ok(()) => hyper::Response::new("OK".to_string()),
                                                Err(e) => {
                                                    let mut response = hyper::Response::new(
                                                        format!("NOT READY: {}", e),
                                                    );
                                                    *response.status_mut() =
                                                        hyper::StatusCode::SERVICE_UNAVAILABLE;
                                                    response
                                                }
                                            }
                                        }
                                        _ => {
                                            let mut response =
                                                hyper::Response::new("Not Found".to_string());
                                            *response.status_mut() = hyper::StatusCode::NOT_FOUND;
                                            response
                                        }
                                    };
                                    Ok::<_, std::convert::Infallible>(response)
                                }
                            },
                        );

                        if let Err(err) = http1::Builder::new().serve_connection(io, service).await
                        {
                            tracing::error!("Error serving connection: {:?}", err);
                        }
                    });
                }
                Err(e) => {
                    tracing::error!("Error accepting connection: {}", e);
                }
            }
        }
    });

    Ok(())
}

/// Record the outcome of a scan and how many watchlist entries it matched
pub fn record_scan_metrics(outcome: &str, match_count: usize) {
    metrics::counter!("scans_total", "outcome" => outcome.to_string()).increment(1);
    if outcome == "completed" {
        metrics::histogram!("scan_matches").record(match_count as f64);
        if match_count > 0 {
            metrics::counter!("scans_with_matches_total").increment(1);
        }
    }
}

/// Record a product lookup and its latency
pub fn record_lookup_metrics(outcome: &str, duration: Duration) {
    metrics::counter!("product_lookups_total", "outcome" => outcome.to_string()).increment(1);
    metrics::histogram!("product_lookup_duration_seconds").record(duration.as_secs_f64());
}

/// Record a watchlist load or save
pub fn record_store_metrics(operation: &str, success: bool, duration: Duration) {
    metrics::counter!(
        "watchlist_store_operations_total",
        "operation" => operation.to_string(),
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
    metrics::histogram!("watchlist_store_duration_seconds").record(duration.as_secs_f64());
}

/// Record database operation metrics
pub fn record_db_metrics(operation: &str, duration: Duration) {
    metrics::counter!("db_operations_total", "operation" => operation.to_string()).increment(1);
    metrics::histogram!("db_operation_duration_seconds").record(duration.as_secs_f64());
}

/// Record health check metrics
pub fn record_health_check_metrics(check_type: &str, success: bool, duration: Duration) {
    metrics::counter!(
        "health_checks_total",
        "check" => check_type.to_string(),
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
    metrics::histogram!("health_check_duration_seconds").record(duration.as_secs_f64());
}

/// Watchlist mutations
#[derive(Debug, Clone, Copy)]
pub enum WatchlistAction {
    Add,
    Remove,
}

/// Record a watchlist mutation and the resulting list size
pub fn record_watchlist_mutation(action: WatchlistAction, watchlist_size: usize) {
    let action_str = match action {
        WatchlistAction::Add => "add",
        WatchlistAction::Remove => "remove",
    };
    metrics::counter!("watchlist_mutations_total", "action" => action_str).increment(1);
    metrics::histogram!("watchlist_size").record(watchlist_size as f64);
}

/// Record an incoming Telegram message by type
pub fn record_telegram_message(message_type: &str) {
    metrics::counter!("telegram_messages_total", "type" => message_type.to_string()).increment(1);
}

/// User action enumeration for engagement tracking
#[derive(Debug, Clone, Copy)]
pub enum UserAction {
    /// User sent /start
    StartCommand,
    /// User sent /help
    HelpCommand,
    /// User listed their watchlist
    WatchlistCommand,
    /// User listed the alias groups
    AliasesCommand,
    /// User sent a barcode
    Scan,
    /// User added a watchlist term
    AddTerm,
    /// User removed a watchlist term
    RemoveTerm,
}

/// Record user engagement business metrics
pub fn record_user_engagement_metrics(
    user_id: i64,
    action: UserAction,
    language_code: Option<&str>,
) {
    let action_str = match action {
        UserAction::StartCommand => "start_command",
        UserAction::HelpCommand => "help_command",
        UserAction::WatchlistCommand => "watchlist_command",
        UserAction::AliasesCommand => "aliases_command",
        UserAction::Scan => "scan",
        UserAction::AddTerm => "add_term",
        UserAction::RemoveTerm => "remove_term",
    };
    metrics::counter!("user_actions_total", "action" => action_str).increment(1);

    if let Some(lang) = language_code {
        metrics::counter!("user_language_usage_total", "language" => lang.to_string())
            .increment(1);
    }

    tracing::debug!(
        user_id = %user_id,
        action = %action_str,
        language_code = ?language_code,
        "User engagement recorded"
    );
}
