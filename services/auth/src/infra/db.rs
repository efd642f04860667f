use anyhow::{Context as _, anyhow};
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use uuid::Uuid;

use cloudmail_auth_schema::{reg_keys, roles, settings, users, verify_records};

use crate::domain::repository::{
    AccountRepository, RegKeyRepository, RoleRepository, SettingsPatch, SettingsRepository,
    VerifyCounterRepository,
};
use crate::domain::types::{
    Account, AccountStatus, GlobalSettings, NewAccount, RegKey, Role, VerifyPurpose,
};
use crate::error::AuthServiceError;

// ── Account repository ────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbAccountRepository {
    pub db: DatabaseConnection,
}

impl AccountRepository for DbAccountRepository {
    async fn find_by_email_include_deleted(
        &self,
        email: &str,
    ) -> Result<Option<Account>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find account by email")?;
        model.map(account_from_model).transpose()
    }

    async fn insert(&self, account: &NewAccount) -> Result<Uuid, AuthServiceError> {
        let id = Uuid::now_v7();
        users::ActiveModel {
            id: Set(id),
            email: Set(account.email.clone()),
            name: Set(account.name.clone()),
            password_hash: Set(account.password_hash.clone()),
            password_salt: Set(account.password_salt.clone()),
            role_id: Set(account.role_id),
            status: Set(0),
            is_del: Set(false),
            reg_key_id: Set(account.reg_key_id),
            created_at: Set(Utc::now()),
            last_login_at: Set(None),
        }
        .insert(&self.db)
        .await
        .context("insert account")?;
        Ok(id)
    }

    async fn touch_last_login(&self, user_id: Uuid) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(user_id),
            last_login_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("touch last login")?;
        Ok(())
    }
}

fn account_from_model(model: users::Model) -> Result<Account, AuthServiceError> {
    let status = AccountStatus::try_from(model.status)?;
    Ok(Account {
        id: model.id,
        email: model.email,
        name: model.name,
        password_hash: model.password_hash,
        password_salt: model.password_salt,
        role_id: model.role_id,
        status,
        is_del: model.is_del,
        reg_key_id: model.reg_key_id,
        created_at: model.created_at,
        last_login_at: model.last_login_at,
    })
}

// ── Role repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRoleRepository {
    pub db: DatabaseConnection,
}

impl RoleRepository for DbRoleRepository {
    async fn find_default(&self) -> Result<Option<Role>, AuthServiceError> {
        let model = roles::Entity::find()
            .filter(roles::Column::IsDefault.eq(true))
            .one(&self.db)
            .await
            .context("find default role")?;
        model.map(role_from_model).transpose()
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Role>, AuthServiceError> {
        let model = roles::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find role by id")?;
        model.map(role_from_model).transpose()
    }
}

fn role_from_model(model: roles::Model) -> Result<Role, AuthServiceError> {
    let avail_domains: Vec<String> =
        serde_json::from_value(model.avail_domains).context("parse role avail_domains")?;
    Ok(Role {
        id: model.id,
        name: model.name,
        avail_domains,
        is_default: model.is_default,
    })
}

// ── Registration key repository ───────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRegKeyRepository {
    pub db: DatabaseConnection,
}

impl RegKeyRepository for DbRegKeyRepository {
    async fn find_by_code(&self, code: &str) -> Result<Option<RegKey>, AuthServiceError> {
        let model = reg_keys::Entity::find()
            .filter(reg_keys::Column::Code.eq(code))
            .one(&self.db)
            .await
            .context("find reg key by code")?;
        Ok(model.map(|m| RegKey {
            id: m.id,
            code: m.code,
            role_id: m.role_id,
            remaining: m.remaining,
            expire_date: m.expire_date,
        }))
    }

    async fn consume(&self, key_id: i64, amount: i32) -> Result<bool, AuthServiceError> {
        // Guarded single-statement decrement; a losing race updates zero rows
        // instead of driving `remaining` negative.
        let result = reg_keys::Entity::update_many()
            .col_expr(
                reg_keys::Column::Remaining,
                Expr::col(reg_keys::Column::Remaining).sub(amount),
            )
            .filter(reg_keys::Column::Id.eq(key_id))
            .filter(reg_keys::Column::Remaining.gte(amount))
            .exec(&self.db)
            .await
            .context("consume reg key")?;
        Ok(result.rows_affected > 0)
    }
}

// ── Verification counter repository ───────────────────────────────────────────

#[derive(Clone)]
pub struct DbVerifyCounterRepository {
    pub db: DatabaseConnection,
}

impl VerifyCounterRepository for DbVerifyCounterRepository {
    async fn count(&self, ip: &str, purpose: VerifyPurpose) -> Result<i32, AuthServiceError> {
        let model = verify_records::Entity::find()
            .filter(verify_records::Column::Ip.eq(ip))
            .filter(verify_records::Column::Purpose.eq(purpose.as_i16()))
            .one(&self.db)
            .await
            .context("read verify counter")?;
        Ok(model.map_or(0, |m| m.count))
    }

    async fn increment(&self, ip: &str, purpose: VerifyPurpose) -> Result<i32, AuthServiceError> {
        let now = Utc::now();
        let model = verify_records::Entity::insert(verify_records::ActiveModel {
            ip: Set(ip.to_owned()),
            purpose: Set(purpose.as_i16()),
            count: Set(1),
            updated_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([verify_records::Column::Ip, verify_records::Column::Purpose])
                .value(
                    verify_records::Column::Count,
                    Expr::col(verify_records::Column::Count).add(1),
                )
                .value(verify_records::Column::UpdatedAt, Expr::value(now))
                .to_owned(),
        )
        .exec_with_returning(&self.db)
        .await
        .context("increment verify counter")?;
        Ok(model.count)
    }
}

// ── Settings repository ───────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbSettingsRepository {
    pub db: DatabaseConnection,
}

impl SettingsRepository for DbSettingsRepository {
    async fn load(&self) -> Result<Option<GlobalSettings>, AuthServiceError> {
        let model = settings::Entity::find()
            .one(&self.db)
            .await
            .context("load settings row")?;
        Ok(model.map(|m| GlobalSettings {
            register: m.register,
            register_verify: m.register_verify,
            reg_verify_count: m.reg_verify_count,
            add_verify_count: m.add_verify_count,
            reg_key_mode: m.reg_key_mode,
            title: m.title,
            challenge_site_key: m.challenge_site_key,
            challenge_secret_key: m.challenge_secret_key,
        }))
    }

    async fn update(&self, patch: &SettingsPatch) -> Result<(), AuthServiceError> {
        let model = settings::Entity::find()
            .one(&self.db)
            .await
            .context("load settings row")?
            .ok_or_else(|| anyhow!("settings row missing"))?;

        let mut active: settings::ActiveModel = model.into();
        if let Some(v) = patch.register {
            active.register = Set(v);
        }
        if let Some(v) = patch.register_verify {
            active.register_verify = Set(v);
        }
        if let Some(v) = patch.reg_verify_count {
            active.reg_verify_count = Set(v);
        }
        if let Some(v) = patch.add_verify_count {
            active.add_verify_count = Set(v);
        }
        if let Some(v) = patch.reg_key_mode {
            active.reg_key_mode = Set(v);
        }
        if let Some(ref v) = patch.title {
            active.title = Set(v.clone());
        }
        if let Some(ref v) = patch.challenge_site_key {
            active.challenge_site_key = Set(v.clone());
        }
        if let Some(ref v) = patch.challenge_secret_key {
            active.challenge_secret_key = Set(v.clone());
        }
        active.update(&self.db).await.context("update settings")?;
        Ok(())
    }
}
