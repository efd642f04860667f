use anyhow::Context as _;
use deadpool_redis::Pool;
use deadpool_redis::redis::AsyncCommands;
use uuid::Uuid;

use crate::domain::repository::{SessionStore, SettingsCache};
use crate::domain::types::{GlobalSettings, SessionRecord};
use crate::error::AuthServiceError;

fn session_key(user_id: Uuid) -> String {
    format!("auth:session:{user_id}")
}

/// Key under which the serialized settings row is cached.
const SETTINGS_KEY: &str = "auth:settings";

// ── Session store ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisSessionStore {
    pub pool: Pool,
}

impl SessionStore for RedisSessionStore {
    async fn get(&self, user_id: Uuid) -> Result<Option<SessionRecord>, AuthServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        let value: Option<String> = conn
            .get(session_key(user_id))
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| AuthServiceError::Internal(e.into()))?;
        value
            .map(|json| serde_json::from_str(&json).context("parse session record"))
            .transpose()
            .map_err(AuthServiceError::Internal)
    }

    async fn put(
        &self,
        user_id: Uuid,
        record: &SessionRecord,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        let json = serde_json::to_string(record).context("serialize session record")?;
        let (): () = conn
            .set_ex(session_key(user_id), json, ttl_secs)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(())
    }
}

// ── Settings cache ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct RedisSettingsCache {
    pub pool: Pool,
}

impl SettingsCache for RedisSettingsCache {
    async fn read(&self) -> Result<Option<GlobalSettings>, AuthServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        let value: Option<String> = conn
            .get(SETTINGS_KEY)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| AuthServiceError::Internal(e.into()))?;
        value
            .map(|json| serde_json::from_str(&json).context("parse settings snapshot"))
            .transpose()
            .map_err(AuthServiceError::Internal)
    }

    async fn write(&self, settings: &GlobalSettings) -> Result<(), AuthServiceError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|e| AuthServiceError::Internal(e.into()))?;
        let json = serde_json::to_string(settings).context("serialize settings snapshot")?;
        // Single SET — readers observe the old or new snapshot, never a mix.
        let (): () = conn
            .set(SETTINGS_KEY, json)
            .await
            .map_err(|e: deadpool_redis::redis::RedisError| AuthServiceError::Internal(e.into()))?;
        Ok(())
    }
}
