use crate::error::{AppError, AppResult};
use crate::middleware::auth::parse_user_id;
use crate::middleware::AuthUser;
use crate::models::EventModel;
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::event::EventService;
use crate::utils::render_markdown;
use axum::{
    extract::{Path, Query},
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub description: String,
    /// Sanitized HTML rendering of the description
    pub description_html: String,
    pub location: Option<String>,
    pub starts_at: Option<String>,
    pub created_at: String,
}

impl From<EventModel> for EventResponse {
    fn from(e: EventModel) -> Self {
        Self {
            id: e.id,
            user_id: e.user_id,
            description_html: render_markdown(&e.description),
            title: e.title,
            description: e.description,
            location: e.location,
            starts_at: e.starts_at.map(|t| t.to_string()),
            created_at: e.created_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 120))]
    pub title: String,
    #[validate(length(max = 20000))]
    pub description: String,
    #[validate(length(max = 200))]
    pub location: Option<String>,
    /// Naive UTC timestamp, e.g. "2026-08-01T18:00:00"
    pub starts_at: Option<chrono::NaiveDateTime>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AddItemRequest {
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub quantity: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/events",
    params(
        ("page" = Option<u64>, Query, description = "Page number (1-based)"),
        ("per_page" = Option<u64>, Query, description = "Page size"),
    ),
    responses(
        (status = 200, description = "Paginated events", body = PaginatedResponse<EventResponse>),
    ),
    tag = "events"
)]
pub async fn list_events(
    Extension(db): Extension<DatabaseConnection>,
    Query(pagination): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let page = pagination.page.unwrap_or(1).max(1);
    let per_page = pagination.per_page.unwrap_or(20).clamp(1, 100);

    let service = EventService::new(db);
    let (events, total) = service.list(page, per_page).await?;
    let items: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn get_event(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = EventService::new(db);
    let event = service.get(id).await?;
    Ok(ApiResponse::ok(EventResponse::from(event)))
}

#[utoipa::path(
    post,
    path = "/api/v1/events",
    security(("jwt_token" = [])),
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Event created", body = EventResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "events"
)]
pub async fn create_event(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let user_id = parse_user_id(&auth_user)?;
    let service = EventService::new(db);
    let event = service
        .create(
            user_id,
            &payload.title,
            &payload.description,
            payload.location,
            payload.starts_at,
        )
        .await?;

    Ok(ApiResponse::ok(EventResponse::from(event)))
}

#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    request_body = CreateEventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Event not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn update_event(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<CreateEventRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let user_id = parse_user_id(&auth_user)?;
    let service = EventService::new(db);
    let event = service
        .update(
            id,
            user_id,
            &payload.title,
            &payload.description,
            payload.location,
            payload.starts_at,
        )
        .await?;

    Ok(ApiResponse::ok(EventResponse::from(event)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Event not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn delete_event(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let service = EventService::new(db);
    service.delete(id, user_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "deleted": true })))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}/items",
    params(("id" = i32, Path, description = "Event ID")),
    responses(
        (status = 200, description = "Items for the event"),
        (status = 404, description = "Event not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn list_items(
    Extension(db): Extension<DatabaseConnection>,
    Path(id): Path<i32>,
) -> AppResult<impl IntoResponse> {
    let service = EventService::new(db);
    let items = service.list_items(id).await?;
    Ok(ApiResponse::ok(items))
}

#[utoipa::path(
    post,
    path = "/api/v1/events/{id}/items",
    security(("jwt_token" = [])),
    params(("id" = i32, Path, description = "Event ID")),
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Item added"),
        (status = 403, description = "Not the owner", body = AppError),
    ),
    tag = "events"
)]
pub async fn add_item(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path(id): Path<i32>,
    Json(payload): Json<AddItemRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(format!("Validation error: {e}")))?;

    let user_id = parse_user_id(&auth_user)?;
    let service = EventService::new(db);
    let item = service
        .add_item(id, user_id, &payload.name, payload.quantity.unwrap_or(1))
        .await?;
    Ok(ApiResponse::ok(item))
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}/items/{item_id}",
    security(("jwt_token" = [])),
    params(
        ("id" = i32, Path, description = "Event ID"),
        ("item_id" = i32, Path, description = "Item ID"),
    ),
    responses(
        (status = 200, description = "Item removed"),
        (status = 403, description = "Not the owner", body = AppError),
        (status = 404, description = "Item not found", body = AppError),
    ),
    tag = "events"
)]
pub async fn remove_item(
    Extension(db): Extension<DatabaseConnection>,
    auth_user: AuthUser,
    Path((id, item_id)): Path<(i32, i32)>,
) -> AppResult<impl IntoResponse> {
    let user_id = parse_user_id(&auth_user)?;
    let service = EventService::new(db);
    service.remove_item(id, item_id, user_id).await?;
    Ok(ApiResponse::ok(serde_json::json!({ "deleted": true })))
}
