use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Auth service domain error variants.
///
/// Login failures collapse to the single `IncorrectCredentials` variant no
/// matter the root cause, so responses never reveal whether an account exists
/// under any permitted domain.
#[derive(Debug, thiserror::Error)]
pub enum AuthServiceError {
    // validation
    #[error("not a valid email address")]
    InvalidEmail,
    #[error("password must be at least 6 characters")]
    PasswordTooShort,
    #[error("password must be at most 30 characters")]
    PasswordTooLong,
    #[error("email local part must be at most 30 characters")]
    LocalPartTooLong,

    // policy
    #[error("registration is closed")]
    RegistrationClosed,
    #[error("email domain is not allowed")]
    DomainNotAllowed,
    #[error("registration key role is not allowed for this domain")]
    RegKeyRoleDomainForbidden,
    #[error("default role is not allowed for this domain")]
    DefaultRoleDomainForbidden,
    #[error("account already exists")]
    AccountExists,
    #[error("account was deleted")]
    AccountDeleted,
    #[error("account is banned")]
    AccountBanned,
    #[error("forbidden")]
    Forbidden,

    // human-verification challenge
    #[error("verification challenge required")]
    ChallengeRequired,
    #[error("verification challenge failed")]
    ChallengeInvalid,

    // registration key ledger
    #[error("registration key required")]
    RegKeyMissing,
    #[error("registration key not found")]
    RegKeyNotFound,
    #[error("registration key expired")]
    RegKeyExpired,
    #[error("registration key has no remaining uses")]
    RegKeyExhausted,

    // credentials (deliberately generic)
    #[error("incorrect email or password")]
    IncorrectCredentials,

    // infrastructure
    #[error("settings unavailable")]
    SettingsUnavailable,
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl AuthServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::PasswordTooShort => "PASSWORD_TOO_SHORT",
            Self::PasswordTooLong => "PASSWORD_TOO_LONG",
            Self::LocalPartTooLong => "LOCAL_PART_TOO_LONG",
            Self::RegistrationClosed => "REGISTRATION_CLOSED",
            Self::DomainNotAllowed => "DOMAIN_NOT_ALLOWED",
            Self::RegKeyRoleDomainForbidden => "REG_KEY_ROLE_DOMAIN_FORBIDDEN",
            Self::DefaultRoleDomainForbidden => "DEFAULT_ROLE_DOMAIN_FORBIDDEN",
            Self::AccountExists => "ACCOUNT_EXISTS",
            Self::AccountDeleted => "ACCOUNT_DELETED",
            Self::AccountBanned => "ACCOUNT_BANNED",
            Self::Forbidden => "FORBIDDEN",
            Self::ChallengeRequired => "CHALLENGE_REQUIRED",
            Self::ChallengeInvalid => "CHALLENGE_INVALID",
            Self::RegKeyMissing => "REG_KEY_MISSING",
            Self::RegKeyNotFound => "REG_KEY_NOT_FOUND",
            Self::RegKeyExpired => "REG_KEY_EXPIRED",
            Self::RegKeyExhausted => "REG_KEY_EXHAUSTED",
            Self::IncorrectCredentials => "INCORRECT_CREDENTIALS",
            Self::SettingsUnavailable => "SETTINGS_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl IntoResponse for AuthServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::InvalidEmail
            | Self::PasswordTooShort
            | Self::PasswordTooLong
            | Self::LocalPartTooLong
            | Self::ChallengeInvalid
            | Self::RegKeyMissing
            | Self::RegKeyNotFound
            | Self::RegKeyExpired
            | Self::RegKeyExhausted => StatusCode::BAD_REQUEST,
            Self::RegistrationClosed
            | Self::DomainNotAllowed
            | Self::RegKeyRoleDomainForbidden
            | Self::DefaultRoleDomainForbidden
            | Self::AccountDeleted
            | Self::AccountBanned
            | Self::Forbidden => StatusCode::FORBIDDEN,
            Self::AccountExists => StatusCode::CONFLICT,
            Self::ChallengeRequired => StatusCode::PRECONDITION_REQUIRED,
            Self::IncorrectCredentials => StatusCode::UNAUTHORIZED,
            Self::SettingsUnavailable | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        // the response body stays generic; the anyhow chain only reaches the log
        if let Self::Internal(ref e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        let body = serde_json::json!({
            "kind": self.kind(),
            "message": self.to_string(),
        });
        (status, axum::Json(body)).into_response()
    }
}
