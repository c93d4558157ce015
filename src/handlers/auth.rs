use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::response::ApiResponse;
use crate::services::auth::AuthService;
use crate::services::email::EmailService;
use axum::{
    extract::ConnectInfo,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use utoipa::ToSchema;
use validator::Validate;

use super::user::UserAttributes;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Display name (2-16 characters, stored title-cased)
    pub name: String,
    /// Email address (optional)
    #[validate(email)]
    pub email: Option<String>,
    /// Password (min 8 characters)
    #[validate(length(min = 8))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Display name or email
    pub login: String,
    /// Password
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    /// JWT access token
    pub token: String,
    /// JWT refresh token
    pub refresh_token: String,
    /// User ID
    pub user_id: i32,
    /// Stored (normalized) display name
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    pub token: String,
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    pub token: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account registered", body = AuthResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 422, description = "Lifecycle validation failed", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AuthService::new(db);
    let (user, access_token, refresh_token) = service
        .register(&payload.name, payload.email.as_deref(), &payload.password)
        .await?;

    Ok(ApiResponse::ok(AuthResponse {
        token: access_token,
        refresh_token,
        user_id: user.id,
        name: user.name,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 401, description = "Invalid credentials or inactive account", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (user, access_token, refresh_token) = service
        .login(&payload.login, &payload.password, Some(addr.ip().to_string()))
        .await?;

    Ok(ApiResponse::ok(AuthResponse {
        token: access_token,
        refresh_token,
        user_id: user.id,
        name: user.name,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = TokenResponse),
        (status = 401, description = "Invalid or expired refresh token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<RefreshTokenRequest>,
) -> AppResult<impl IntoResponse> {
    let claims =
        crate::utils::jwt::decode_jwt(&payload.refresh_token).map_err(|_| AppError::Unauthorized)?;
    if !crate::utils::jwt::is_refresh_token(&claims) {
        return Err(AppError::Unauthorized);
    }
    let user_id: i32 = claims.sub.parse().map_err(|_| AppError::Unauthorized)?;

    let service = AuthService::new(db);
    let (access_token, refresh_token) = service
        .rotate_refresh_token(user_id, &payload.refresh_token)
        .await?;

    Ok(ApiResponse::ok(TokenResponse {
        token: access_token,
        refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    security(("jwt_token" = [])),
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn logout(
    Extension(db): Extension<DatabaseConnection>,
    _auth_user: AuthUser,
    Json(payload): Json<RefreshTokenRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    service.revoke_refresh_token(&payload.refresh_token).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "logged_out": true })))
}

#[utoipa::path(
    get,
    path = "/api/v1/auth/me",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Current account", body = UserAttributes),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn get_current_user(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let service = AuthService::new(db);
    let user = service.get_user_by_id(user_id).await?;
    Ok(ApiResponse::ok(UserAttributes::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/auth/password",
    security(("jwt_token" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Current password incorrect", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "auth"
)]
pub async fn change_password(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let user_id = parse_user_id(&auth_user)?;
    let service = AuthService::new(db);
    service
        .change_password(user_id, &payload.current_password, &payload.new_password)
        .await?;
    Ok(ApiResponse::ok(serde_json::json!({ "changed": true })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        // Always 200 so callers cannot probe which emails exist
        (status = 200, description = "Reset requested"),
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AuthService::new(db);
    service
        .forgot_password(&payload.email, &email_service)
        .await?;
    Ok(ApiResponse::ok(serde_json::json!({ "requested": true })))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "Invalid or expired token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn reset_password(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let service = AuthService::new(db);
    service
        .reset_password(&payload.token, &payload.new_password)
        .await?;
    Ok(ApiResponse::ok(serde_json::json!({ "reset": true })))
}
