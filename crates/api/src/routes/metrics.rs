//! Prometheus scrape endpoint for checkout and payment counters.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — renders the recorder's snapshot in the Prometheus
/// text exposition format.
pub async fn get(State(recorder): State<PrometheusHandle>) -> impl IntoResponse {
    let body = recorder.render();
    (
        StatusCode::OK,
        [(
            header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        body,
    )
}
