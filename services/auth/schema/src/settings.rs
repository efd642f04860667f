use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Global settings, a single authoritative row. The serialized row is cached
/// wholesale in the key-value store and refreshed on every write.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i16,
    /// 0 = open, 1 = closed.
    pub register: i16,
    /// 0 = disabled, 1 = always, 2 = count-based.
    pub register_verify: i16,
    /// Unchallenged registration attempts per source before a challenge
    /// becomes mandatory (count-based mode).
    pub reg_verify_count: i32,
    /// Same threshold for the add-account purpose.
    pub add_verify_count: i32,
    /// 0 = disabled, 1 = mandatory, 2 = optional.
    pub reg_key_mode: i16,
    pub title: String,
    /// Public site key of the human-verification challenge widget.
    pub challenge_site_key: Option<String>,
    /// Server-side challenge secret. Never leaves the service unmasked.
    pub challenge_secret_key: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
