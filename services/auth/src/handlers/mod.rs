pub mod auth;
pub mod settings;

use axum::http::HeaderMap;

/// Best-effort client IP for verification counters: first `x-forwarded-for`
/// hop, then `x-real-ip`, then a sentinel. The counters only need a stable
/// per-source key, not a verified address.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| "unknown".to_owned())
}
