// Telemetry module for structured logging and metrics

use anyhow::Result;
use metrics::{counter, describe_counter};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize structured logging
///
/// `RUST_LOG` takes precedence over `log_level`. With `json` set, events are
/// emitted as one JSON object per line; otherwise the human formatter is used.
pub fn init_logging(log_level: &str, json: bool) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to create env filter: {}", e))?;

    let layer = if json {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_filter(env_filter)
            .boxed()
    } else {
        fmt::layer().with_target(true).with_filter(env_filter).boxed()
    };

    tracing_subscriber::registry()
        .with(layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing subscriber: {}", e))?;

    tracing::info!(log_level = log_level, json = json, "Structured logging initialized");

    Ok(())
}

/// Initialize the Prometheus metrics exporter
///
/// Registered counters:
/// - birthday_matches_total
/// - leap_year_notices_total
/// - notifications_sent_total{kind,vendor}
/// - notifications_failed_total{kind,vendor}
/// - scans_total
pub fn init_metrics(metrics_port: u16) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", metrics_port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid metrics port: {}", e))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus exporter: {}", e))?;

    describe_counter!(
        "birthday_matches_total",
        "Total number of contacts whose birthday matched a scan"
    );
    describe_counter!(
        "leap_year_notices_total",
        "Total number of March 1st leap-year notices"
    );
    describe_counter!(
        "notifications_sent_total",
        "Total number of notifications delivered by a backend"
    );
    describe_counter!(
        "notifications_failed_total",
        "Total number of failed notification attempts"
    );
    describe_counter!("scans_total", "Total number of completed contact scans");

    tracing::info!(
        metrics_port = metrics_port,
        metrics_endpoint = format!("http://0.0.0.0:{}/metrics", metrics_port),
        "Prometheus metrics exporter initialized"
    );

    Ok(())
}

#[inline]
pub fn record_notification_success(kind: &str, vendor: &str) {
    counter!(
        "notifications_sent_total",
        "kind" => kind.to_string(),
        "vendor" => vendor.to_string()
    )
    .increment(1);
}

#[inline]
pub fn record_notification_failure(kind: &str, vendor: &str) {
    counter!(
        "notifications_failed_total",
        "kind" => kind.to_string(),
        "vendor" => vendor.to_string()
    )
    .increment(1);
}

#[inline]
pub fn record_birthday_match() {
    counter!("birthday_matches_total").increment(1);
}

#[inline]
pub fn record_leap_year_notice() {
    counter!("leap_year_notices_total").increment(1);
}

#[inline]
pub fn record_scan() {
    counter!("scans_total").increment(1);
}
