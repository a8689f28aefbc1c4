//! Liveness endpoint for load balancers and deploy checks.

use axum::Json;
use serde::Serialize;

/// Body of the liveness response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

/// GET /health — reports that the storefront API is up.
///
/// Always answers `200 OK`; a failing process simply stops answering.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "storefront-api",
    })
}
