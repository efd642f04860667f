use axum::http::StatusCode;

/// Handler for `GET /healthz` — liveness check.
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Handler for `GET /readyz` — readiness check. Services that need to probe
/// their own backends replace this with a stateful handler.
pub async fn readyz() -> StatusCode {
    StatusCode::OK
}
