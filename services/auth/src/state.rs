use deadpool_redis::Pool as RedisPool;
use sea_orm::DatabaseConnection;

use crate::infra::cache::{RedisSessionStore, RedisSettingsCache};
use crate::infra::challenge::TurnstileVerifier;
use crate::infra::db::{
    DbAccountRepository, DbRegKeyRepository, DbRoleRepository, DbSettingsRepository,
    DbVerifyCounterRepository,
};

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub redis: RedisPool,
    pub http: reqwest::Client,
    pub jwt_secret: String,
    /// Permitted mail domains in login-resolution order.
    pub domain_list: Vec<String>,
}

impl AppState {
    pub fn account_repo(&self) -> DbAccountRepository {
        DbAccountRepository {
            db: self.db.clone(),
        }
    }

    pub fn role_repo(&self) -> DbRoleRepository {
        DbRoleRepository {
            db: self.db.clone(),
        }
    }

    pub fn reg_key_repo(&self) -> DbRegKeyRepository {
        DbRegKeyRepository {
            db: self.db.clone(),
        }
    }

    pub fn verify_counter_repo(&self) -> DbVerifyCounterRepository {
        DbVerifyCounterRepository {
            db: self.db.clone(),
        }
    }

    pub fn settings_repo(&self) -> DbSettingsRepository {
        DbSettingsRepository {
            db: self.db.clone(),
        }
    }

    pub fn session_store(&self) -> RedisSessionStore {
        RedisSessionStore {
            pool: self.redis.clone(),
        }
    }

    pub fn settings_cache(&self) -> RedisSettingsCache {
        RedisSettingsCache {
            pool: self.redis.clone(),
        }
    }

    pub fn challenge_verifier(&self) -> TurnstileVerifier {
        TurnstileVerifier::new(self.http.clone())
    }
}
