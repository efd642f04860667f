use anyhow::anyhow;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthServiceError;

/// Password length bounds enforced at registration.
pub const PASSWORD_MIN_LEN: usize = 6;
pub const PASSWORD_MAX_LEN: usize = 30;

/// Maximum length of the email local part (the mailbox name).
pub const LOCAL_PART_MAX_LEN: usize = 30;

/// Maximum live session tokens per account. Appending to a full list evicts
/// the first-inserted token (FIFO, not LRU).
pub const MAX_SESSION_TOKENS: usize = 10;

/// Registration-key expiry is compared at calendar-day granularity in a fixed
/// UTC+8 reference offset, regardless of where the request comes from.
pub const REFERENCE_TZ_OFFSET_SECS: i32 = 8 * 3600;

/// Today's date in the reference time zone.
pub fn reference_today() -> NaiveDate {
    let offset = FixedOffset::east_opt(REFERENCE_TZ_OFFSET_SECS).expect("valid fixed offset");
    Utc::now().with_timezone(&offset).date_naive()
}

// ── Account ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountStatus {
    Active,
    Banned,
}

impl TryFrom<i16> for AccountStatus {
    type Error = anyhow::Error;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Active),
            1 => Ok(Self::Banned),
            other => Err(anyhow!("unknown account status {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub password_salt: String,
    pub role_id: i32,
    pub status: AccountStatus,
    pub is_del: bool,
    pub reg_key_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Fields written when a registration commits.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    /// Derived profile data, initialized from the email local part.
    pub name: String,
    pub password_hash: String,
    pub password_salt: String,
    pub role_id: i32,
    pub reg_key_id: Option<i64>,
}

// ── Role ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Role {
    pub id: i32,
    pub name: String,
    /// Permitted email domains; an empty list means all domains.
    pub avail_domains: Vec<String>,
    pub is_default: bool,
}

// ── Registration key ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RegKey {
    pub id: i64,
    pub code: String,
    pub role_id: i32,
    pub remaining: i32,
    pub expire_date: NaiveDate,
}

impl RegKey {
    /// A key expires at the start of its expiry day (reference time zone),
    /// so it is already invalid on `expire_date` itself.
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        today >= self.expire_date
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining <= 0
    }
}

// ── Verification counter ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPurpose {
    Register,
    AddAccount,
}

impl VerifyPurpose {
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Register => 0,
            Self::AddAccount => 1,
        }
    }
}

// ── Settings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterMode {
    Open,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyMode {
    Disabled,
    Always,
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegKeyMode {
    Disabled,
    Mandatory,
    Optional,
}

/// The global settings row as cached in the key-value store. Written
/// wholesale on refresh; readers may see a stale copy but never a partial
/// one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub register: i16,
    pub register_verify: i16,
    pub reg_verify_count: i32,
    pub add_verify_count: i32,
    pub reg_key_mode: i16,
    pub title: String,
    pub challenge_site_key: Option<String>,
    pub challenge_secret_key: Option<String>,
}

/// Settings snapshot handed to each request: the cached settings row plus the
/// configured permitted-domain list, so flows never reach for ambient state.
#[derive(Debug, Clone)]
pub struct SettingsSnapshot {
    pub settings: GlobalSettings,
    /// Permitted mail domains in login-resolution order, without `@`.
    pub domain_list: Vec<String>,
}

impl SettingsSnapshot {
    pub fn register_mode(&self) -> Result<RegisterMode, AuthServiceError> {
        match self.settings.register {
            0 => Ok(RegisterMode::Open),
            1 => Ok(RegisterMode::Closed),
            other => Err(anyhow!("unknown register mode {other}").into()),
        }
    }

    pub fn verify_mode(&self) -> Result<VerifyMode, AuthServiceError> {
        match self.settings.register_verify {
            0 => Ok(VerifyMode::Disabled),
            1 => Ok(VerifyMode::Always),
            2 => Ok(VerifyMode::Count),
            other => Err(anyhow!("unknown verify mode {other}").into()),
        }
    }

    pub fn reg_key_mode(&self) -> Result<RegKeyMode, AuthServiceError> {
        match self.settings.reg_key_mode {
            0 => Ok(RegKeyMode::Disabled),
            1 => Ok(RegKeyMode::Mandatory),
            2 => Ok(RegKeyMode::Optional),
            other => Err(anyhow!("unknown reg-key mode {other}").into()),
        }
    }
}

// ── Session record ───────────────────────────────────────────────────────────

/// Cached profile of the owning account, stored inside the session record so
/// the gateway can serve identity lookups without a relational round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSnapshot {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role_id: i32,
}

impl From<&Account> for ProfileSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            name: account.name.clone(),
            role_id: account.role_id,
        }
    }
}

/// Active-session state for one account, held in the key-value store under
/// the account id with a TTL equal to the token validity window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Live session identifiers, oldest first.
    pub tokens: Vec<String>,
    pub user: ProfileSnapshot,
    #[serde(serialize_with = "cloudmail_core::serde::to_rfc3339_ms")]
    pub refresh_time: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(user: ProfileSnapshot) -> Self {
        Self {
            tokens: Vec::new(),
            user,
            refresh_time: Utc::now(),
        }
    }

    /// Append a session id, evicting the oldest entries past the cap.
    pub fn push_token(&mut self, token: String) {
        self.tokens.push(token);
        while self.tokens.len() > MAX_SESSION_TOKENS {
            self.tokens.remove(0);
        }
    }

    /// Remove a session id if present. The record is kept (and written back)
    /// even when the list becomes empty, preserving refresh metadata.
    pub fn remove_token(&mut self, token: &str) {
        if let Some(index) = self.tokens.iter().position(|t| t == token) {
            self.tokens.remove(index);
        }
    }
}
