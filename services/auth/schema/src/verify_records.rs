use sea_orm::entity::prelude::*;

/// Per-IP human-verification attempt counter, one row per (ip, purpose).
/// Window rollover (resetting counts) is owned by an external job.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "verify_records")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub ip: String,
    /// 0 = register, 1 = add-account.
    pub purpose: i16,
    pub count: i32,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
