//! # Metrics
//!
//! Prometheus metrics for monitoring the provider.
//!
//! ## Metrics Exposed
//!
//! - `cloud_provider_operations_total` - Lifecycle operations by resource type and operation
//! - `cloud_provider_operation_errors_total` - Failed operations by resource type, operation and error kind
//! - `cloud_provider_operation_duration_seconds` - Duration of lifecycle operations
//! - `cloud_provider_remote_calls_total` - Remote API calls by service and outcome
//! - `cloud_provider_resources_gone_total` - Resources found deleted out of band

use anyhow::{Context, Result};
use prometheus::{Encoder, HistogramVec, IntCounterVec, Registry, TextEncoder};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cloud_provider_operations_total",
            "Total number of lifecycle operations by resource type and operation",
        ),
        &["resource_type", "operation"],
    )
    .expect("Failed to create OPERATIONS_TOTAL metric - this should never happen")
});

static OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cloud_provider_operation_errors_total",
            "Total number of failed lifecycle operations by error kind",
        ),
        &["resource_type", "operation", "kind"],
    )
    .expect("Failed to create OPERATION_ERRORS_TOTAL metric - this should never happen")
});

static OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "cloud_provider_operation_duration_seconds",
            "Duration of lifecycle operations in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["resource_type", "operation"],
    )
    .expect("Failed to create OPERATION_DURATION metric - this should never happen")
});

static REMOTE_CALLS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cloud_provider_remote_calls_total",
            "Total number of remote API calls by service and outcome",
        ),
        &["service", "outcome"],
    )
    .expect("Failed to create REMOTE_CALLS_TOTAL metric - this should never happen")
});

static RESOURCES_GONE_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "cloud_provider_resources_gone_total",
            "Total number of resources found deleted outside the orchestrator",
        ),
        &["resource_type"],
    )
    .expect("Failed to create RESOURCES_GONE_TOTAL metric - this should never happen")
});

/// Register every metric with the provider registry
///
/// Safe to call more than once; metrics already registered are skipped.
///
/// # Errors
/// The registry rejects a collector for any reason other than it being registered already.
pub fn register_metrics() -> Result<()> {
    let collectors: [Box<dyn prometheus::core::Collector>; 5] = [
        Box::new(OPERATIONS_TOTAL.clone()),
        Box::new(OPERATION_ERRORS_TOTAL.clone()),
        Box::new(OPERATION_DURATION.clone()),
        Box::new(REMOTE_CALLS_TOTAL.clone()),
        Box::new(RESOURCES_GONE_TOTAL.clone()),
    ];
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(e).context("Failed to register metric"),
        }
    }
    Ok(())
}

/// Text exposition of every registered metric
///
/// # Errors
/// Encoding fails or the encoded output is not UTF-8.
pub fn gather_metrics() -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .context("Failed to encode metrics")?;
    String::from_utf8(buffer).context("Metrics exposition is not valid UTF-8")
}

pub fn record_operation(resource_type: &str, operation: &str, duration: f64) {
    OPERATIONS_TOTAL
        .with_label_values(&[resource_type, operation])
        .inc();
    OPERATION_DURATION
        .with_label_values(&[resource_type, operation])
        .observe(duration);
}

pub fn increment_operation_errors(resource_type: &str, operation: &str, kind: &str) {
    OPERATION_ERRORS_TOTAL
        .with_label_values(&[resource_type, operation, kind])
        .inc();
}

pub fn increment_remote_calls(service: &str, outcome: &str) {
    REMOTE_CALLS_TOTAL
        .with_label_values(&[service, outcome])
        .inc();
}

pub fn increment_resources_gone(resource_type: &str) {
    RESOURCES_GONE_TOTAL
        .with_label_values(&[resource_type])
        .inc();
}
