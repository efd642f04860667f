use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use serde::{Deserialize, Deserializer, Serialize};

use cloudmail_auth_types::identity::IdentityHeaders;

use crate::domain::repository::SettingsPatch;
use crate::error::AuthServiceError;
use crate::handlers::client_ip;
use crate::state::AppState;
use crate::usecase::settings::{
    QuerySettingsUseCase, UpdateSettingsUseCase, VerifyFlagsUseCase, mask_secret,
};

/// Minimum identity role allowed to read or write global settings.
const ADMIN_ROLE: u8 = 2;

// ── GET /settings/website ────────────────────────────────────────────────────

/// Public website configuration. Exposes only what the login/registration
/// page needs — never the challenge secret.
#[derive(Serialize)]
pub struct WebsiteConfigResponse {
    pub register: i16,
    pub register_verify: i16,
    pub reg_key_mode: i16,
    pub title: String,
    pub challenge_site_key: Option<String>,
    pub domain_list: Vec<String>,
}

pub async fn website_config(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AuthServiceError> {
    let snapshot = QuerySettingsUseCase {
        cache: state.settings_cache(),
        domain_list: state.domain_list.clone(),
    }
    .execute()
    .await?;

    let s = &snapshot.settings;
    Ok(Json(WebsiteConfigResponse {
        register: s.register,
        register_verify: s.register_verify,
        reg_key_mode: s.reg_key_mode,
        title: s.title.clone(),
        challenge_site_key: s.challenge_site_key.clone(),
        domain_list: snapshot.domain_list.clone(),
    }))
}

// ── GET /settings ────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct AdminSettingsResponse {
    pub register: i16,
    pub register_verify: i16,
    pub reg_verify_count: i32,
    pub add_verify_count: i32,
    pub reg_key_mode: i16,
    pub title: String,
    pub challenge_site_key: Option<String>,
    /// Masked — at most the first 12 characters of the secret are shown.
    pub challenge_secret_key: Option<String>,
    pub domain_list: Vec<String>,
    pub reg_verify_open: bool,
    pub add_verify_open: bool,
}

pub async fn get_settings(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AuthServiceError> {
    if identity.user_role < ADMIN_ROLE {
        return Err(AuthServiceError::Forbidden);
    }
    let snapshot = QuerySettingsUseCase {
        cache: state.settings_cache(),
        domain_list: state.domain_list.clone(),
    }
    .execute()
    .await?;

    let flags = VerifyFlagsUseCase {
        counters: state.verify_counter_repo(),
    }
    .execute(&snapshot, &client_ip(&headers))
    .await?;

    let s = &snapshot.settings;
    Ok(Json(AdminSettingsResponse {
        register: s.register,
        register_verify: s.register_verify,
        reg_verify_count: s.reg_verify_count,
        add_verify_count: s.add_verify_count,
        reg_key_mode: s.reg_key_mode,
        title: s.title.clone(),
        challenge_site_key: s.challenge_site_key.clone(),
        challenge_secret_key: s.challenge_secret_key.as_deref().map(mask_secret),
        domain_list: snapshot.domain_list.clone(),
        reg_verify_open: flags.reg_verify_open,
        add_verify_open: flags.add_verify_open,
    }))
}

// ── PUT /settings ────────────────────────────────────────────────────────────

/// Maps a present field to `Some(..)` so that, combined with
/// `#[serde(default)]`, an absent field (`None`, leave untouched) is
/// distinguishable from an explicit `null` (`Some(None)`, clear the value).
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Deserialize)]
pub struct UpdateSettingsRequest {
    pub register: Option<i16>,
    pub register_verify: Option<i16>,
    pub reg_verify_count: Option<i32>,
    pub add_verify_count: Option<i32>,
    pub reg_key_mode: Option<i16>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub challenge_site_key: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub challenge_secret_key: Option<Option<String>>,
}

pub async fn update_settings(
    identity: IdentityHeaders,
    State(state): State<AppState>,
    Json(body): Json<UpdateSettingsRequest>,
) -> Result<impl IntoResponse, AuthServiceError> {
    if identity.user_role < ADMIN_ROLE {
        return Err(AuthServiceError::Forbidden);
    }
    let usecase = UpdateSettingsUseCase {
        repo: state.settings_repo(),
        cache: state.settings_cache(),
    };
    usecase
        .execute(SettingsPatch {
            register: body.register,
            register_verify: body.register_verify,
            reg_verify_count: body.reg_verify_count,
            add_verify_count: body.add_verify_count,
            reg_key_mode: body.reg_key_mode,
            title: body.title,
            challenge_site_key: body.challenge_site_key,
            challenge_secret_key: body.challenge_secret_key,
        })
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
