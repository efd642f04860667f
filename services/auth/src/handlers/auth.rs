use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

use cloudmail_auth_types::identity::IdentityHeaders;

use crate::error::AuthServiceError;
use crate::handlers::client_ip;
use crate::state::AppState;
use crate::usecase::login::{LoginInput, LoginUseCase};
use crate::usecase::register::{RegisterInput, RegisterUseCase};
use crate::usecase::session::LogoutUseCase;
use crate::usecase::settings::QuerySettingsUseCase;

// ── POST /auth/register ──────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub challenge_token: Option<String>,
    pub reg_key_code: Option<String>,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub verification_now_required: bool,
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let snapshot = QuerySettingsUseCase {
        cache: state.settings_cache(),
        domain_list: state.domain_list.clone(),
    }
    .execute()
    .await?;

    let usecase = RegisterUseCase {
        accounts: state.account_repo(),
        roles: state.role_repo(),
        reg_keys: state.reg_key_repo(),
        counters: state.verify_counter_repo(),
        challenge: state.challenge_verifier(),
    };
    let out = usecase
        .execute(
            &snapshot,
            RegisterInput {
                email: body.email,
                password: body.password,
                challenge_token: body.challenge_token,
                reg_key_code: body.reg_key_code,
                source_ip: client_ip(&headers),
            },
        )
        .await?;

    Ok((
        StatusCode::OK,
        Json(RegisterResponse {
            verification_now_required: out.verification_now_required,
        }),
    ))
}

// ── POST /auth/login ─────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    /// Bare mailbox name; the service resolves it across permitted domains.
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let snapshot = QuerySettingsUseCase {
        cache: state.settings_cache(),
        domain_list: state.domain_list.clone(),
    }
    .execute()
    .await?;

    let usecase = LoginUseCase {
        accounts: state.account_repo(),
        sessions: state.session_store(),
        jwt_secret: state.jwt_secret.clone(),
    };
    let out = usecase
        .execute(
            &snapshot,
            LoginInput {
                email_or_local: body.email,
                password: body.password,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(LoginResponse { token: out.token })))
}

// ── POST /auth/logout ────────────────────────────────────────────────────────

pub async fn logout(
    identity: IdentityHeaders,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let usecase = LogoutUseCase {
        sessions: state.session_store(),
    };
    usecase
        .execute(identity.user_id, &identity.session_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
