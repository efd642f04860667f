//! Gateway-injected identity headers extractor.

use axum::extract::FromRequestParts;
use http::StatusCode;
use http::request::Parts;
use uuid::Uuid;

/// Identity injected by the gateway after validating the session token, via
/// `x-cloudmail-user-id`, `x-cloudmail-user-role` and `x-cloudmail-session-id`
/// headers.
///
/// Returns 401 if any header is absent or malformed. Role enforcement (403)
/// is done by handlers after extraction.
#[derive(Debug, Clone)]
pub struct IdentityHeaders {
    pub user_id: Uuid,
    pub user_role: u8,
    /// Session id from the validated token's `sid` claim; what logout removes
    /// from the account's active-token list.
    pub session_id: String,
}

impl<S> FromRequestParts<S> for IdentityHeaders
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    // axum-core 0.5 defines this as `fn -> impl Future + Send` (not `async fn`).
    // In Rust 1.82+ precise capturing, `async fn` captures lifetimes differently,
    // causing E0195. Fix: extract values synchronously, return a 'static async move block.
    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let user_id = parts
            .headers
            .get("x-cloudmail-user-id")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<Uuid>().ok());

        let user_role = parts
            .headers
            .get("x-cloudmail-user-role")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u8>().ok());

        let session_id = parts
            .headers
            .get("x-cloudmail-session-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        async move {
            let user_id = user_id.ok_or(StatusCode::UNAUTHORIZED)?;
            let user_role = user_role.ok_or(StatusCode::UNAUTHORIZED)?;
            let session_id = session_id.ok_or(StatusCode::UNAUTHORIZED)?;
            Ok(Self {
                user_id,
                user_role,
                session_id,
            })
        }
    }
}
