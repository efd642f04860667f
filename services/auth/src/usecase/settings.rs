use anyhow::anyhow;

use crate::domain::repository::{
    SettingsCache, SettingsPatch, SettingsRepository, VerifyCounterRepository,
};
use crate::domain::types::{GlobalSettings, SettingsSnapshot, VerifyPurpose};
use crate::error::AuthServiceError;

/// How many leading characters of a secret survive masking.
const SECRET_MASK_PREFIX_LEN: usize = 12;

/// Mask a secret for display: at most the first 12 characters followed by a
/// masking suffix. Short secrets never index out of bounds — `take` just
/// yields what there is.
pub fn mask_secret(secret: &str) -> String {
    let prefix: String = secret.chars().take(SECRET_MASK_PREFIX_LEN).collect();
    format!("{prefix}******")
}

// ── Query (read-through) ─────────────────────────────────────────────────────

/// Read the cached settings snapshot for one request. A missing snapshot is a
/// hard failure — flows never run against a silently-defaulted configuration.
pub struct QuerySettingsUseCase<C: SettingsCache> {
    pub cache: C,
    pub domain_list: Vec<String>,
}

impl<C: SettingsCache> QuerySettingsUseCase<C> {
    pub async fn execute(&self) -> Result<SettingsSnapshot, AuthServiceError> {
        let settings = self
            .cache
            .read()
            .await?
            .ok_or(AuthServiceError::SettingsUnavailable)?;
        Ok(SettingsSnapshot {
            settings,
            domain_list: self.domain_list.clone(),
        })
    }
}

// ── Refresh (write-through) ──────────────────────────────────────────────────

/// Re-read the authoritative settings row and replace the cached snapshot
/// wholesale. Run at startup and after every settings write.
pub struct RefreshSettingsUseCase<R: SettingsRepository, C: SettingsCache> {
    pub repo: R,
    pub cache: C,
}

impl<R: SettingsRepository, C: SettingsCache> RefreshSettingsUseCase<R, C> {
    pub async fn execute(&self) -> Result<GlobalSettings, AuthServiceError> {
        let settings = self
            .repo
            .load()
            .await?
            .ok_or_else(|| anyhow!("settings row missing"))?;
        self.cache.write(&settings).await?;
        Ok(settings)
    }
}

// ── Update ───────────────────────────────────────────────────────────────────

pub struct UpdateSettingsUseCase<R: SettingsRepository, C: SettingsCache> {
    pub repo: R,
    pub cache: C,
}

impl<R: SettingsRepository, C: SettingsCache> UpdateSettingsUseCase<R, C> {
    pub async fn execute(&self, patch: SettingsPatch) -> Result<(), AuthServiceError> {
        self.repo.update(&patch).await?;
        // refresh immediately; readers may still see the old snapshot until
        // this write lands
        let settings = self
            .repo
            .load()
            .await?
            .ok_or_else(|| anyhow!("settings row missing"))?;
        self.cache.write(&settings).await?;
        Ok(())
    }
}

// ── Verification flags for the admin view ────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct VerifyFlags {
    /// Whether the next registration from this source needs a challenge.
    pub reg_verify_open: bool,
    /// Same for the add-account purpose.
    pub add_verify_open: bool,
}

pub struct VerifyFlagsUseCase<V: VerifyCounterRepository> {
    pub counters: V,
}

impl<V: VerifyCounterRepository> VerifyFlagsUseCase<V> {
    pub async fn execute(
        &self,
        snapshot: &SettingsSnapshot,
        ip: &str,
    ) -> Result<VerifyFlags, AuthServiceError> {
        let reg = self.counters.count(ip, VerifyPurpose::Register).await?;
        let add = self.counters.count(ip, VerifyPurpose::AddAccount).await?;
        Ok(VerifyFlags {
            reg_verify_open: reg >= snapshot.settings.reg_verify_count,
            add_verify_open: add >= snapshot.settings.add_verify_count,
        })
    }
}
