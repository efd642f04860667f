//! Session-token signing and validation.
//!
//! The auth service signs a token binding an account id to a fresh session
//! id; the gateway validates inbound tokens and forwards the identity to
//! services via headers (see [`crate::identity`]).

use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
#[cfg(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test))]
use serde::Serialize;
use uuid::Uuid;

/// Session-token JWT lifetime in seconds (7 days). Doubles as the TTL of the
/// session record held in the key-value store.
pub const SESSION_TOKEN_EXP: u64 = 604_800;

/// Identity extracted from a validated session token.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub user_id: Uuid,
    /// Opaque per-login session identifier, matched against the account's
    /// active-token list on logout.
    pub session_id: String,
    pub expires_at: u64,
}

/// Errors returned by [`validate_session_token`].
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
}

/// JWT claims payload shared by token creation (auth service) and validation
/// (gateway).
///
/// `sub` is the account id (UUID string), `sid` the per-login session id,
/// `exp` seconds since epoch.
#[derive(Debug, Deserialize)]
#[cfg_attr(any(feature = "USE_ONLY_IN_AUTH_SERVICE", test), derive(Serialize))]
pub struct SessionClaims {
    pub sub: String,
    pub sid: String,
    pub exp: u64,
}

/// Sign a session token. Only the auth service creates tokens; the feature
/// gate keeps other services from accidentally depending on the encoder.
#[cfg(feature = "USE_ONLY_IN_AUTH_SERVICE")]
pub fn sign_session_token(
    user_id: Uuid,
    session_id: &str,
    expires_at: u64,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    use jsonwebtoken::{EncodingKey, Header, encode};

    let claims = SessionClaims {
        sub: user_id.to_string(),
        sid: session_id.to_owned(),
        exp: expires_at,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Validate a session token (signature + expiry) and extract its identity.
pub fn validate_session_token(token: &str, secret: &str) -> Result<SessionInfo, TokenError> {
    let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
    validation.validate_exp = true;
    validation.required_spec_claims.clear();
    validation.set_required_spec_claims(&["exp", "sub"]);

    let data = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        _ => TokenError::Malformed,
    })?;

    let user_id = data
        .claims
        .sub
        .parse::<Uuid>()
        .map_err(|_| TokenError::Malformed)?;

    Ok(SessionInfo {
        user_id,
        session_id: data.claims.sid,
        expires_at: data.claims.exp,
    })
}
