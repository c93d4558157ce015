use crate::error::{AppError, AppResult};
use crate::middleware::auth::require_admin;
use crate::middleware::AuthUser;
use crate::models::UserModel;
use crate::response::{ApiResponse, PaginatedResponse};
use crate::services::user::UserService;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Deliberate administrative projection of a user row. This is not the
/// generic attribute-serialization path; admins need the flags that path
/// suppresses.
#[derive(Debug, Serialize, ToSchema)]
pub struct AdminUserResponse {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub active: bool,
    pub role_id: i32,
    pub sign_in_count: i32,
    pub created_at: String,
}

impl From<UserModel> for AdminUserResponse {
    fn from(u: UserModel) -> Self {
        Self {
            id: u.id,
            name: u.name,
            email: u.email,
            active: u.active,
            role_id: u.role_id,
            sign_in_count: u.sign_in_count,
            created_at: u.created_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserListQuery {
    pub page: Option<u64>,
    pub per_page: Option<u64>,
    /// Optional scope: `default`, `fresh` or `default_fresh`
    pub scope: Option<String>,
    /// Cutoff for the fresh scopes, e.g. "2026-08-01T00:00:00"
    pub since: Option<chrono::NaiveDateTime>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    security(("jwt_token" = [])),
    params(
        ("page" = Option<u64>, Query, description = "Page number (1-based)"),
        ("per_page" = Option<u64>, Query, description = "Page size"),
        ("scope" = Option<String>, Query, description = "default | fresh | default_fresh"),
        ("since" = Option<String>, Query, description = "Cutoff for fresh scopes"),
    ),
    responses(
        (status = 200, description = "Users", body = PaginatedResponse<AdminUserResponse>),
        (status = 403, description = "Admin role required", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&db, &auth_user).await?;

    let service = UserService::new(db);

    if let Some(scope) = query.scope.as_deref() {
        let since = query.since;
        let users = match (scope, since) {
            ("default", _) => service.default_users().await?,
            ("fresh", Some(since)) => service.fresh_users(since).await?,
            ("default_fresh", Some(since)) => service.default_fresh_users(since).await?,
            ("fresh" | "default_fresh", None) => {
                return Err(AppError::Validation(
                    "The fresh scopes require a since parameter".to_string(),
                ));
            }
            _ => {
                return Err(AppError::Validation(format!(
                    "Unknown scope '{scope}', expected default, fresh or default_fresh"
                )));
            }
        };
        let total = users.len() as u64;
        let items: Vec<AdminUserResponse> =
            users.into_iter().map(AdminUserResponse::from).collect();
        return Ok(ApiResponse::ok(PaginatedResponse::new(
            items, total, 1, total.max(1),
        )));
    }

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let (users, total) = service.list(page, per_page).await?;
    let items: Vec<AdminUserResponse> = users.into_iter().map(AdminUserResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/toggle-active",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "Active flag flipped", body = AdminUserResponse),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn toggle_user_active(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    require_admin(&db, &auth_user).await?;

    let service = UserService::new(db);
    let user = service.toggle_active(id).await?;
    Ok(ApiResponse::ok(AdminUserResponse::from(user)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/users/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User and owned records removed"),
        (status = 403, description = "Admin role required", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn destroy_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let admin_id = require_admin(&db, &auth_user).await?;
    if admin_id == id {
        return Err(AppError::Validation(
            "Admins cannot remove their own account".to_string(),
        ));
    }

    let service = UserService::new(db);
    service.destroy(id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "deleted": true })))
}
