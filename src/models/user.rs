use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub active: bool,
    pub sign_in_count: i32,
    pub current_sign_in_at: Option<DateTime>,
    pub current_sign_in_ip: Option<String>,
    pub last_sign_in_at: Option<DateTime>,
    pub last_sign_in_ip: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_password_sent_at: Option<DateTime>,
    pub avatar_url: Option<String>,
    pub avatar_thumb_url: Option<String>,
    pub role_id: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::role::Entity",
        from = "Column::RoleId",
        to = "super::role::Column::Id"
    )]
    Role,
    #[sea_orm(has_many = "super::event::Entity")]
    Event,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comment,
}

impl Related<super::role::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Role.def()
    }
}

impl Related<super::event::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Event.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// One-line summary used wherever the account is displayed.
    pub fn description(&self) -> String {
        format!("{} ({})", self.name, self.email.as_deref().unwrap_or_default())
    }
}

/// A user row together with its resolved role, for role checks.
#[derive(Clone, Debug)]
pub struct UserWithRole {
    pub user: Model,
    pub role: Option<super::role::Model>,
}

impl super::role::HasRole for UserWithRole {
    fn role_code(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.code.as_str())
    }
}
