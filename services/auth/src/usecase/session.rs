use uuid::Uuid;

use cloudmail_auth_types::token::SESSION_TOKEN_EXP;

use crate::domain::repository::SessionStore;
use crate::error::AuthServiceError;

/// Logout: remove the caller's own session id from the account's
/// active-token list. The session id comes from the already-validated token
/// (gateway middleware), not from the request body.
pub struct LogoutUseCase<S: SessionStore> {
    pub sessions: S,
}

impl<S: SessionStore> LogoutUseCase<S> {
    pub async fn execute(&self, user_id: Uuid, session_id: &str) -> Result<(), AuthServiceError> {
        let Some(mut record) = self.sessions.get(user_id).await? else {
            // nothing to revoke; logout is idempotent
            return Ok(());
        };
        record.remove_token(session_id);
        // written back even when empty so refresh metadata survives; the
        // re-armed TTL keeps the record bounded
        self.sessions
            .put(user_id, &record, SESSION_TOKEN_EXP)
            .await?;
        Ok(())
    }
}
