use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub commentable_type: String,
    pub commentable_id: i32,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// What a comment is attached to. The storage columns are a type tag plus an
/// id; in code the pair is always resolved through this union so there is no
/// stringly-typed dispatch outside this module.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CommentTarget {
    Event(i32),
    User(i32),
}

const TAG_EVENT: &str = "event";
const TAG_USER: &str = "user";

impl CommentTarget {
    pub fn from_columns(tag: &str, id: i32) -> Option<Self> {
        match tag {
            TAG_EVENT => Some(Self::Event(id)),
            TAG_USER => Some(Self::User(id)),
            _ => None,
        }
    }

    pub fn into_columns(self) -> (&'static str, i32) {
        match self {
            Self::Event(id) => (TAG_EVENT, id),
            Self::User(id) => (TAG_USER, id),
        }
    }
}

impl Model {
    /// Resolved target; `None` only for rows with an unknown type tag,
    /// which the write path never produces.
    pub fn target(&self) -> Option<CommentTarget> {
        CommentTarget::from_columns(&self.commentable_type, self.commentable_id)
    }
}
