use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Stored as an integer; admin is 0, matching the wire and
/// seed data the training clients expect.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(num_value = 0)]
    Admin,
    #[sea_orm(num_value = 1)]
    Standard,
}

/// Account status. Disabled accounts keep their rows; nothing is ever
/// hard-deleted.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i32", db_type = "Integer")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    #[sea_orm(num_value = 0)]
    Disabled,
    #[sea_orm(num_value = 1)]
    Enabled,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// XOR-encoded with the process-wide key, hex output. Reversible by
    /// design; this is a password-storage training target, not a hash.
    pub password: String,

    /// Security question text, paired with a plaintext answer. Only the
    /// reset flow reads these.
    pub question: String,

    pub answer: String,

    pub role: Role,

    pub status: UserStatus,

    pub notes: Option<String>,

    pub created_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::messages::Entity")]
    Messages,
}

impl Related<super::messages::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Messages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
