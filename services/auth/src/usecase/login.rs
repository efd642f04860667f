use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::anyhow;
use chrono::Utc;
use uuid::Uuid;

use cloudmail_auth_types::token::{SESSION_TOKEN_EXP, sign_session_token};

use crate::domain::repository::{AccountRepository, SessionStore};
use crate::domain::types::{
    Account, AccountStatus, ProfileSnapshot, SessionRecord, SettingsSnapshot,
};
use crate::error::AuthServiceError;
use crate::infra::password;

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before UNIX epoch")
        .as_secs()
}

pub struct LoginInput {
    /// Bare mailbox name; the flow composes it with every permitted domain
    /// in configured order.
    pub email_or_local: String,
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutput {
    pub user_id: Uuid,
    pub token: String,
}

pub struct LoginUseCase<A, S>
where
    A: AccountRepository,
    S: SessionStore,
{
    pub accounts: A,
    pub sessions: S,
    pub jwt_secret: String,
}

impl<A, S> LoginUseCase<A, S>
where
    A: AccountRepository,
    S: SessionStore,
{
    pub async fn execute(
        &self,
        settings: &SettingsSnapshot,
        input: LoginInput,
    ) -> Result<LoginOutput, AuthServiceError> {
        if input.email_or_local.is_empty() || input.password.is_empty() {
            return Err(AuthServiceError::IncorrectCredentials);
        }
        if settings.domain_list.is_empty() {
            return Err(anyhow!("no permitted domains configured").into());
        }

        let account = self.resolve_account(settings, &input).await?;

        if account.is_del {
            return Err(AuthServiceError::AccountDeleted);
        }
        if account.status == AccountStatus::Banned {
            return Err(AuthServiceError::AccountBanned);
        }

        let session_id = Uuid::new_v4().to_string();
        let expires_at = now_secs() + SESSION_TOKEN_EXP;
        let token = sign_session_token(account.id, &session_id, expires_at, &self.jwt_secret)
            .map_err(|e| AuthServiceError::Internal(e.into()))?;

        let mut record = self
            .sessions
            .get(account.id)
            .await?
            .unwrap_or_else(|| SessionRecord::new(ProfileSnapshot::from(&account)));
        record.push_token(session_id);
        record.refresh_time = Utc::now();

        self.accounts.touch_last_login(account.id).await?;
        self.sessions
            .put(account.id, &record, SESSION_TOKEN_EXP)
            .await?;

        Ok(LoginOutput {
            user_id: account.id,
            token,
        })
    }

    /// Try every permitted domain in order. A candidate account with a wrong
    /// password does NOT stop the search — remaining domains are still tried,
    /// so callers cannot learn which domain holds an account. On exhaustion
    /// the single generic credentials error is returned regardless of cause.
    async fn resolve_account(
        &self,
        settings: &SettingsSnapshot,
        input: &LoginInput,
    ) -> Result<Account, AuthServiceError> {
        for domain in &settings.domain_list {
            let candidate = format!("{}@{}", input.email_or_local, domain);
            if let Some(account) = self
                .accounts
                .find_by_email_include_deleted(&candidate)
                .await?
            {
                let matches = password::verify_password(
                    &input.password,
                    &account.password_salt,
                    &account.password_hash,
                )
                .map_err(|e| AuthServiceError::Internal(anyhow!("verify password: {e}")))?;
                if matches {
                    return Ok(account);
                }
            }
        }
        Err(AuthServiceError::IncorrectCredentials)
    }
}
