use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::models::{CommentModel, CommentTarget};
use crate::response::ApiResponse;
use crate::services::comment::CommentService;
use crate::services::user::UserService;
use crate::utils::render_markdown;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct CommentResponse {
    pub id: i32,
    pub user_id: i32,
    pub body: String,
    /// Sanitized HTML rendering of the body
    pub body_html: String,
    pub created_at: String,
}

impl From<CommentModel> for CommentResponse {
    fn from(c: CommentModel) -> Self {
        Self {
            id: c.id,
            user_id: c.user_id,
            body_html: render_markdown(&c.body),
            body: c.body,
            created_at: c.created_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 10000))]
    pub body: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/comments",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Comments on the event", body = [CommentResponse]),
    ),
    tag = "comments"
)]
pub async fn list_event_comments(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = CommentService::new(db);
    let comments = service.list_for_target(CommentTarget::Event(id)).await?;
    let items: Vec<CommentResponse> = comments.into_iter().map(CommentResponse::from).collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/comments",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 400, description = "Unknown target", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_event_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let user_id = parse_user_id(&auth_user)?;
    let service = CommentService::new(db);
    let comment = service
        .create(user_id, CommentTarget::Event(id), &payload.body)
        .await?;
    Ok(ApiResponse::ok(CommentResponse::from(comment)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{name}/comments",
    params(("name" = String, Path, description = "Display name")),
    responses(
        (status = 200, description = "Comments on the user's profile", body = [CommentResponse]),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn list_user_comments(
    Extension(db): Extension<DatabaseConnection>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let users = UserService::new(db.clone());
    let target = users.get_by_name(&name).await?;

    let service = CommentService::new(db);
    let comments = service
        .list_for_target(CommentTarget::User(target.id))
        .await?;
    let items: Vec<CommentResponse> = comments.into_iter().map(CommentResponse::from).collect();
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/v1/users/{name}/comments",
    security(("jwt_token" = [])),
    params(("name" = String, Path, description = "Display name")),
    request_body = CreateCommentRequest,
    responses(
        (status = 200, description = "Comment created", body = CommentResponse),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn create_user_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(name): Path<String>,
    Json(payload): Json<CreateCommentRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let user_id = parse_user_id(&auth_user)?;
    let users = UserService::new(db.clone());
    let target = users.get_by_name(&name).await?;

    let service = CommentService::new(db);
    let comment = service
        .create(user_id, CommentTarget::User(target.id), &payload.body)
        .await?;
    Ok(ApiResponse::ok(CommentResponse::from(comment)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/comments/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 403, description = "Not the author", body = AppError),
        (status = 404, description = "Comment not found", body = AppError),
    ),
    tag = "comments"
)]
pub async fn delete_comment(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let service = CommentService::new(db);
    service.delete(id, user_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "deleted": true })))
}
