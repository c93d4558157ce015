use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::ApiResponse;
use crate::services::user::{UserChanges, UserService};
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// The generic attribute-serialization path for a user. Every other column
/// is suppressed here no matter who asks; callers needing more go through a
/// deliberate projection (see the admin handlers).
#[derive(Debug, Serialize, ToSchema)]
pub struct UserAttributes {
    pub name: String,
    pub email: Option<String>,
    pub description: String,
}

impl From<UserModel> for UserAttributes {
    fn from(u: UserModel) -> Self {
        Self {
            description: u.description(),
            name: u.name,
            email: u.email,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    /// New display name (validated, not re-title-cased)
    pub name: Option<String>,
    /// New email; an empty string clears it
    pub email: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{name}",
    params(("name" = String, Path, description = "Display name")),
    responses(
        (status = 200, description = "User profile", body = UserAttributes),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn get_user_profile(
    Extension(db): Extension<DatabaseConnection>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let user = service.get_by_name(&name).await?;
    Ok(ApiResponse::ok(UserAttributes::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/profile",
    security(("jwt_token" = [])),
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserAttributes),
        (status = 401, description = "Unauthorized", body = AppError),
        (status = 422, description = "Validation failed", body = AppError),
    ),
    tag = "users"
)]
pub async fn update_profile(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let service = UserService::new(db);
    let user = service
        .update(
            user_id,
            UserChanges {
                name: payload.name,
                email: payload.email,
            },
        )
        .await?;

    Ok(ApiResponse::ok(UserAttributes::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{name}/events",
    params(("name" = String, Path, description = "Display name")),
    responses(
        (status = 200, description = "Events owned by the user"),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_user_events(
    Extension(db): Extension<DatabaseConnection>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let user = service.get_by_name(&name).await?;
    let events = service.events_for(user.id).await?;
    Ok(ApiResponse::ok(events))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{name}/items",
    params(("name" = String, Path, description = "Display name")),
    responses(
        (status = 200, description = "Distinct items across the user's events"),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_user_items(
    Extension(db): Extension<DatabaseConnection>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let user = service.get_by_name(&name).await?;
    let items = service.items_for(user.id).await?;
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{name}/commented-events",
    params(("name" = String, Path, description = "Display name")),
    responses(
        (status = 200, description = "Events the user has commented on"),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_commented_events(
    Extension(db): Extension<DatabaseConnection>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let user = service.get_by_name(&name).await?;
    let events = service.commented_events_for(user.id).await?;
    Ok(ApiResponse::ok(events))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{name}/commented-users",
    params(("name" = String, Path, description = "Display name")),
    responses(
        (status = 200, description = "Users the user has commented on", body = [UserAttributes]),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "users"
)]
pub async fn list_commented_users(
    Extension(db): Extension<DatabaseConnection>,
    Path(name): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = UserService::new(db);
    let user = service.get_by_name(&name).await?;
    let users = service.commented_users_for(user.id).await?;
    let attributes: Vec<UserAttributes> = users.into_iter().map(UserAttributes::from).collect();
    Ok(ApiResponse::ok(attributes))
}
