use crate::response::ApiResponse;
use axum::response::IntoResponse;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct AboutResponse {
    pub name: String,
    pub version: String,
    pub description: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/about",
    responses(
        (status = 200, description = "About this service", body = AboutResponse),
    ),
    tag = "about"
)]
pub async fn about() -> impl IntoResponse {
    ApiResponse::ok(AboutResponse {
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        description: "An events and comments site with role-based accounts".to_string(),
    })
}
