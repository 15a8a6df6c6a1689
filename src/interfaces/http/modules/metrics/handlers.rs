//! Prometheus recorder and scrape endpoint

use std::sync::Mutex;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

#[derive(Clone)]
pub struct MetricsState {
    pub handle: PrometheusHandle,
}

static PROMETHEUS: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Install the process-wide recorder on first use and return its handle.
///
/// A second server started in the same process reuses the first recorder.
pub fn prometheus_handle() -> Result<PrometheusHandle, BuildError> {
    let mut installed = PROMETHEUS.lock().unwrap_or_else(|e| e.into_inner());
    if let Some(handle) = installed.as_ref() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new().install_recorder()?;
    describe_domain_metrics();
    *installed = Some(handle.clone());
    Ok(handle)
}

fn describe_domain_metrics() {
    metrics::describe_counter!("bookings_created_total", "Bookings committed");
    metrics::describe_counter!(
        "booking_conflicts_total",
        "Booking writes refused with a conflict or timeout"
    );
    metrics::describe_counter!("slots_generated_total", "Slots inserted");
    metrics::describe_counter!("slots_cleaned_total", "Future unbooked slots deleted");
}

/// `GET /metrics`: Prometheus text format
pub async fn prometheus_metrics(State(state): State<MetricsState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        state.handle.render(),
    )
}
