use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::upload::{UploadConfig, UploadService};
use crate::services::user::UserService;
use axum::{extract::Multipart, response::IntoResponse, Extension};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub url: String,
    pub thumb_url: String,
}

/// Upload and set the user's avatar plus its 50×50 thumbnail variant.
/// POST /upload/avatar (multipart form: field "file")
#[utoipa::path(
    post,
    path = "/api/v1/upload/avatar",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Avatar stored", body = UploadResponse),
        (status = 400, description = "Unsupported or corrupt file", body = AppError),
        (status = 413, description = "File too large", body = AppError),
    ),
    tag = "uploads"
)]
pub async fn upload_avatar(
    Extension(db): Extension<DatabaseConnection>,
    Extension(config): Extension<UploadConfig>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;

    let field = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();

    let data = field
        .bytes()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read file data: {}", e)))?;

    let stored = UploadService::save_avatar(&config, &data, &content_type).await?;

    let service = UserService::new(db);
    service
        .update_avatar(user_id, &stored.url, &stored.thumb_url)
        .await?;

    Ok(ApiResponse::ok(UploadResponse {
        url: stored.url,
        thumb_url: stored.thumb_url,
    }))
}
