use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Role codes are a pre-seeded lookup; the application never creates or
/// mutates roles at runtime.
pub const ROLE_DEFAULT: &str = "default";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub code: String,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user::Entity")]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Capability of carrying a role. Checks take the entity as a parameter
/// instead of living on the entity itself.
pub trait HasRole {
    /// The role code, or `None` when the role has not been resolved.
    fn role_code(&self) -> Option<&str>;
}

/// True iff the subject's role code is exactly `admin`. An unresolved role
/// answers false, never an error.
pub fn is_admin(subject: &impl HasRole) -> bool {
    subject.role_code() == Some(ROLE_ADMIN)
}
