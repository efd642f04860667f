use anyhow::anyhow;

use crate::domain::policy::{is_domain_permitted, is_valid_email, local_part};
use crate::domain::repository::{
    AccountRepository, ChallengeVerifier, RegKeyRepository, RoleRepository,
    VerifyCounterRepository,
};
use crate::domain::types::{
    LOCAL_PART_MAX_LEN, NewAccount, PASSWORD_MAX_LEN, PASSWORD_MIN_LEN, RegKeyMode, RegisterMode,
    Role, SettingsSnapshot, VerifyMode, VerifyPurpose, reference_today,
};
use crate::error::AuthServiceError;
use crate::infra::password;

pub struct RegisterInput {
    pub email: String,
    pub password: String,
    /// Solved human-verification challenge, when the client was shown one.
    pub challenge_token: Option<String>,
    pub reg_key_code: Option<String>,
    pub source_ip: String,
}

#[derive(Debug)]
pub struct RegisterOutput {
    /// Whether the next registration attempt from this source will require a
    /// solved challenge. Only meaningful under count-based verification;
    /// otherwise mirrors whether a challenge was required this time.
    pub verification_now_required: bool,
}

/// Role grant resolved from a registration key.
struct KeyGrant {
    key_id: i64,
    role_id: i32,
}

pub struct RegisterUseCase<A, R, K, V, C>
where
    A: AccountRepository,
    R: RoleRepository,
    K: RegKeyRepository,
    V: VerifyCounterRepository,
    C: ChallengeVerifier,
{
    pub accounts: A,
    pub roles: R,
    pub reg_keys: K,
    pub counters: V,
    pub challenge: C,
}

impl<A, R, K, V, C> RegisterUseCase<A, R, K, V, C>
where
    A: AccountRepository,
    R: RoleRepository,
    K: RegKeyRepository,
    V: VerifyCounterRepository,
    C: ChallengeVerifier,
{
    /// The registration flow. Checks run in a fixed order and the first
    /// failure wins; nothing is written before the commit sequence at the
    /// end.
    pub async fn execute(
        &self,
        settings: &SettingsSnapshot,
        input: RegisterInput,
    ) -> Result<RegisterOutput, AuthServiceError> {
        if settings.register_mode()? == RegisterMode::Closed {
            return Err(AuthServiceError::RegistrationClosed);
        }
        if !is_valid_email(&input.email) {
            return Err(AuthServiceError::InvalidEmail);
        }
        let password_len = input.password.chars().count();
        if password_len < PASSWORD_MIN_LEN {
            return Err(AuthServiceError::PasswordTooShort);
        }
        if password_len > PASSWORD_MAX_LEN {
            return Err(AuthServiceError::PasswordTooLong);
        }
        if local_part(&input.email).chars().count() > LOCAL_PART_MAX_LEN {
            return Err(AuthServiceError::LocalPartTooLong);
        }
        if !is_domain_permitted(&settings.domain_list, &input.email) {
            return Err(AuthServiceError::DomainNotAllowed);
        }

        let key_grant = match settings.reg_key_mode()? {
            RegKeyMode::Disabled => None,
            RegKeyMode::Mandatory => {
                Some(self.resolve_key_mandatory(input.reg_key_code.as_deref()).await?)
            }
            RegKeyMode::Optional => {
                self.resolve_key_optional(input.reg_key_code.as_deref()).await?
            }
        };

        if let Some(existing) = self
            .accounts
            .find_by_email_include_deleted(&input.email)
            .await?
        {
            // re-registration of a deleted mailbox stays blocked
            if existing.is_del {
                return Err(AuthServiceError::AccountDeleted);
            }
            return Err(AuthServiceError::AccountExists);
        }

        let role = self.resolve_role(key_grant.as_ref()).await?;
        if !is_domain_permitted(&role.avail_domains, &input.email) {
            // the caller messages these two cases differently
            return Err(if key_grant.is_some() {
                AuthServiceError::RegKeyRoleDomainForbidden
            } else {
                AuthServiceError::DefaultRoleDomainForbidden
            });
        }

        let verify_mode = settings.verify_mode()?;
        let mut challenged = false;
        match verify_mode {
            VerifyMode::Disabled => {}
            VerifyMode::Always => {
                self.require_challenge(settings, &input).await?;
                challenged = true;
            }
            VerifyMode::Count => {
                let attempts = self
                    .counters
                    .count(&input.source_ip, VerifyPurpose::Register)
                    .await?;
                if attempts >= settings.settings.reg_verify_count {
                    self.require_challenge(settings, &input).await?;
                    challenged = true;
                }
            }
        }

        // Commit sequence — all checks passed.
        let (password_hash, password_salt) = password::hash_password(&input.password)
            .map_err(|e| AuthServiceError::Internal(anyhow!("hash password: {e}")))?;
        self.accounts
            .insert(&NewAccount {
                email: input.email.clone(),
                name: local_part(&input.email).to_owned(),
                password_hash,
                password_salt,
                role_id: role.id,
                reg_key_id: key_grant.as_ref().map(|g| g.key_id),
            })
            .await?;

        if let Some(grant) = &key_grant {
            // Guarded decrement: a concurrent registration racing for the last
            // use loses here rather than underflowing the count.
            if !self.reg_keys.consume(grant.key_id, 1).await? {
                return Err(AuthServiceError::RegKeyExhausted);
            }
        }

        let verification_now_required = match verify_mode {
            VerifyMode::Count => {
                if challenged {
                    // counter untouched, still at or past the threshold
                    true
                } else {
                    let new_count = self
                        .counters
                        .increment(&input.source_ip, VerifyPurpose::Register)
                        .await?;
                    new_count >= settings.settings.reg_verify_count
                }
            }
            _ => challenged,
        };

        Ok(RegisterOutput {
            verification_now_required,
        })
    }

    async fn resolve_key_mandatory(
        &self,
        code: Option<&str>,
    ) -> Result<KeyGrant, AuthServiceError> {
        let code = code
            .filter(|c| !c.is_empty())
            .ok_or(AuthServiceError::RegKeyMissing)?;
        let key = self
            .reg_keys
            .find_by_code(code)
            .await?
            .ok_or(AuthServiceError::RegKeyNotFound)?;
        // expiry is checked first: an expired key reports Expired even when
        // it also has no uses left
        if key.is_expired(reference_today()) {
            return Err(AuthServiceError::RegKeyExpired);
        }
        if key.is_exhausted() {
            return Err(AuthServiceError::RegKeyExhausted);
        }
        Ok(KeyGrant {
            key_id: key.id,
            role_id: key.role_id,
        })
    }

    /// Optional mode: any failure to resolve falls back to the no-key path.
    /// That fallback is a policy decision; infrastructure errors still
    /// propagate.
    async fn resolve_key_optional(
        &self,
        code: Option<&str>,
    ) -> Result<Option<KeyGrant>, AuthServiceError> {
        let Some(code) = code.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };
        let Some(key) = self.reg_keys.find_by_code(code).await? else {
            return Ok(None);
        };
        if key.is_expired(reference_today()) || key.is_exhausted() {
            return Ok(None);
        }
        Ok(Some(KeyGrant {
            key_id: key.id,
            role_id: key.role_id,
        }))
    }

    async fn resolve_role(&self, grant: Option<&KeyGrant>) -> Result<Role, AuthServiceError> {
        match grant {
            Some(g) => self
                .roles
                .find_by_id(g.role_id)
                .await?
                .ok_or_else(|| anyhow!("reg key references unknown role {}", g.role_id).into()),
            None => self
                .roles
                .find_default()
                .await?
                .ok_or_else(|| anyhow!("no default role configured").into()),
        }
    }

    async fn require_challenge(
        &self,
        settings: &SettingsSnapshot,
        input: &RegisterInput,
    ) -> Result<(), AuthServiceError> {
        let token = input
            .challenge_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(AuthServiceError::ChallengeRequired)?;
        let secret = settings
            .settings
            .challenge_secret_key
            .as_deref()
            .ok_or_else(|| anyhow!("challenge secret not configured"))?;
        if !self.challenge.verify(secret, token, &input.source_ip).await? {
            return Err(AuthServiceError::ChallengeInvalid);
        }
        Ok(())
    }
}
