use tracing_subscriber::EnvFilter;

pub const FETCH_FAILURES: &str = "scanner_fetch_failures_total";
pub const DELIVERIES: &str = "scanner_deliveries_total";

pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();
}

#[cfg(feature = "metrics-exporter")]
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()?;

    tracing::info!(port, "Prometheus exporter listening");
    metrics::gauge!("scanner_up").set(1.0);
    Ok(())
}

#[cfg(not(feature = "metrics-exporter"))]
pub fn init_metrics(_port: u16) -> anyhow::Result<()> {
    Ok(())
}

/// Count a failed upstream request, labelled by endpoint.
pub fn record_fetch_failure(endpoint: &'static str) {
    metrics::counter!(FETCH_FAILURES, "endpoint" => endpoint).increment(1);
}

pub fn record_delivery(outcome: &'static str) {
    metrics::counter!(DELIVERIES, "outcome" => outcome).increment(1);
}
