use sea_orm::entity::prelude::*;

/// Account record. Email is unique among non-soft-deleted rows; deletion is
/// a soft flag so a deleted mailbox address can never be re-registered.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    /// Display name, initialized from the email local part at registration.
    pub name: String,
    pub password_hash: String,
    pub password_salt: String,
    pub role_id: i32,
    /// 0 = active, 1 = banned.
    pub status: i16,
    pub is_del: bool,
    /// Registration key that paid for this account, if any.
    pub reg_key_id: Option<i64>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub last_login_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::roles::Entity",
        from = "Column::RoleId",
        to = "super::roles::Column::Id"
    )]
    Role,
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
