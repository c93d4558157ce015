use crate::{
    error::{AppError, AppResult},
    models::{comment, Comment, CommentModel, CommentTarget, Event, User},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

pub struct CommentService {
    db: DatabaseConnection,
}

impl CommentService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_for_target(&self, target: CommentTarget) -> AppResult<Vec<CommentModel>> {
        let (tag, id) = target.into_columns();
        let comments = Comment::find()
            .filter(comment::Column::CommentableType.eq(tag))
            .filter(comment::Column::CommentableId.eq(id))
            .order_by_asc(comment::Column::CreatedAt)
            .all(&self.db)
            .await?;
        Ok(comments)
    }

    pub async fn create(
        &self,
        user_id: i32,
        target: CommentTarget,
        body: &str,
    ) -> AppResult<CommentModel> {
        self.validate_target(target).await?;

        let (tag, target_id) = target.into_columns();
        let now = chrono::Utc::now().naive_utc();

        let new_comment = comment::ActiveModel {
            user_id: sea_orm::ActiveValue::Set(user_id),
            body: sea_orm::ActiveValue::Set(body.to_string()),
            commentable_type: sea_orm::ActiveValue::Set(tag.to_string()),
            commentable_id: sea_orm::ActiveValue::Set(target_id),
            created_at: sea_orm::ActiveValue::Set(now),
            updated_at: sea_orm::ActiveValue::Set(now),
            ..Default::default()
        };

        Ok(new_comment.insert(&self.db).await?)
    }

    pub async fn delete(&self, id: i32, user_id: i32) -> AppResult<()> {
        let existing = self.get_by_id(id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden);
        }

        Comment::delete_by_id(id).exec(&self.db).await?;
        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<CommentModel> {
        Comment::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    async fn validate_target(&self, target: CommentTarget) -> AppResult<()> {
        let exists = match target {
            CommentTarget::Event(id) => Event::find_by_id(id).one(&self.db).await?.is_some(),
            CommentTarget::User(id) => User::find_by_id(id).one(&self.db).await?.is_some(),
        };
        if !exists {
            return Err(AppError::Validation(
                "Comment target does not exist".to_string(),
            ));
        }
        Ok(())
    }
}
