use sea_orm::entity::prelude::*;

/// Role granted to accounts at registration, either by a registration key or
/// as the system default.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    /// JSON array of email domains this role may register under.
    /// An empty array means every configured domain is permitted.
    pub avail_domains: Json,
    pub is_default: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
    #[sea_orm(has_many = "super::reg_keys::Entity")]
    RegKeys,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::reg_keys::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RegKeys.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
