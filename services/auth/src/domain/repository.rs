#![allow(async_fn_in_trait)]

use uuid::Uuid;

use crate::domain::types::{
    Account, GlobalSettings, NewAccount, RegKey, Role, SessionRecord, VerifyPurpose,
};
use crate::error::AuthServiceError;

/// The only component that touches the relational store for identity.
pub trait AccountRepository: Send + Sync {
    /// Point lookup by full email, including soft-deleted rows — registration
    /// and login both need to see deleted mailboxes.
    async fn find_by_email_include_deleted(
        &self,
        email: &str,
    ) -> Result<Option<Account>, AuthServiceError>;

    /// Insert the account row with its derived profile data; returns the id.
    async fn insert(&self, account: &NewAccount) -> Result<Uuid, AuthServiceError>;

    /// Refresh the account's last-login timestamp.
    async fn touch_last_login(&self, user_id: Uuid) -> Result<(), AuthServiceError>;
}

/// Read-only role lookups.
pub trait RoleRepository: Send + Sync {
    async fn find_default(&self) -> Result<Option<Role>, AuthServiceError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AuthServiceError>;
}

/// Finite-use registration keys.
pub trait RegKeyRepository: Send + Sync {
    async fn find_by_code(&self, code: &str) -> Result<Option<RegKey>, AuthServiceError>;

    /// Atomically decrement `remaining` by `amount`, guarded so the count
    /// never goes negative. Returns `false` when the guard loses (another
    /// request consumed the last use first).
    async fn consume(&self, key_id: i64, amount: i32) -> Result<bool, AuthServiceError>;
}

/// Per-IP, per-purpose human-verification attempt counters.
pub trait VerifyCounterRepository: Send + Sync {
    /// Current count for a source, 0 when no row exists.
    async fn count(&self, ip: &str, purpose: VerifyPurpose) -> Result<i32, AuthServiceError>;

    /// Atomic increment (upsert); returns the new count so the caller can
    /// report whether the next attempt crosses the threshold.
    async fn increment(&self, ip: &str, purpose: VerifyPurpose) -> Result<i32, AuthServiceError>;
}

/// Key-value backed active-session state, keyed by account id.
pub trait SessionStore: Send + Sync {
    async fn get(&self, user_id: Uuid) -> Result<Option<SessionRecord>, AuthServiceError>;

    /// Overwrite the record with a fresh TTL (seconds). Session-list mutation
    /// is read-modify-write with last-write-wins semantics.
    async fn put(
        &self,
        user_id: Uuid,
        record: &SessionRecord,
        ttl_secs: u64,
    ) -> Result<(), AuthServiceError>;
}

/// Key-value cache of the global settings row.
pub trait SettingsCache: Send + Sync {
    async fn read(&self) -> Result<Option<GlobalSettings>, AuthServiceError>;

    /// Replace the snapshot wholesale — readers see the old or the new copy,
    /// never a partial write.
    async fn write(&self, settings: &GlobalSettings) -> Result<(), AuthServiceError>;
}

/// Authoritative relational copy of the global settings row.
pub trait SettingsRepository: Send + Sync {
    async fn load(&self) -> Result<Option<GlobalSettings>, AuthServiceError>;
    async fn update(&self, patch: &SettingsPatch) -> Result<(), AuthServiceError>;
}

/// Partial settings update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub register: Option<i16>,
    pub register_verify: Option<i16>,
    pub reg_verify_count: Option<i32>,
    pub add_verify_count: Option<i32>,
    pub reg_key_mode: Option<i16>,
    pub title: Option<String>,
    pub challenge_site_key: Option<Option<String>>,
    pub challenge_secret_key: Option<Option<String>>,
}

/// External human-verification challenge service.
pub trait ChallengeVerifier: Send + Sync {
    /// Verify a solved challenge token for a source IP. `Ok(false)` means the
    /// service answered and rejected the solution; transport failures are
    /// `Err` and surface as infrastructure errors.
    async fn verify(
        &self,
        secret: &str,
        token: &str,
        remote_ip: &str,
    ) -> Result<bool, AuthServiceError>;
}
