use axum::{extract::Extension, response::IntoResponse, routing::get, Json, Router};
use eventbook::services::email::EmailService;
use eventbook::services::upload::UploadConfig;
use eventbook::{config, migration, routes, services, utils};
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use serde_json::json;
use std::env;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Auth routes
        eventbook::handlers::auth::register,
        eventbook::handlers::auth::login,
        eventbook::handlers::auth::refresh_token,
        eventbook::handlers::auth::logout,
        eventbook::handlers::auth::get_current_user,
        eventbook::handlers::auth::change_password,
        eventbook::handlers::auth::forgot_password,
        eventbook::handlers::auth::reset_password,
        // User routes
        eventbook::handlers::user::get_user_profile,
        eventbook::handlers::user::update_profile,
        eventbook::handlers::user::list_user_events,
        eventbook::handlers::user::list_user_items,
        eventbook::handlers::user::list_commented_events,
        eventbook::handlers::user::list_commented_users,
        // Event routes
        eventbook::handlers::event::list_events,
        eventbook::handlers::event::get_event,
        eventbook::handlers::event::create_event,
        eventbook::handlers::event::update_event,
        eventbook::handlers::event::delete_event,
        eventbook::handlers::event::list_items,
        eventbook::handlers::event::add_item,
        eventbook::handlers::event::remove_item,
        // Comment routes
        eventbook::handlers::comment::list_event_comments,
        eventbook::handlers::comment::create_event_comment,
        eventbook::handlers::comment::list_user_comments,
        eventbook::handlers::comment::create_user_comment,
        eventbook::handlers::comment::delete_comment,
        // Upload routes
        eventbook::handlers::upload::upload_avatar,
        // Admin routes
        eventbook::handlers::admin::list_users,
        eventbook::handlers::admin::toggle_user_active,
        eventbook::handlers::admin::destroy_user,
        // About
        eventbook::handlers::about::about,
    ),
    components(
        schemas(
            eventbook::response::ApiResponse<serde_json::Value>,
            eventbook::response::PaginatedResponse<serde_json::Value>,
            eventbook::response::PaginationQuery,
            eventbook::error::AppError,
            // Auth
            eventbook::handlers::auth::RegisterRequest,
            eventbook::handlers::auth::LoginRequest,
            eventbook::handlers::auth::RefreshTokenRequest,
            eventbook::handlers::auth::AuthResponse,
            eventbook::handlers::auth::TokenResponse,
            eventbook::handlers::auth::ChangePasswordRequest,
            eventbook::handlers::auth::ForgotPasswordRequest,
            eventbook::handlers::auth::ResetPasswordRequest,
            // User
            eventbook::handlers::user::UserAttributes,
            eventbook::handlers::user::UpdateProfileRequest,
            // Event
            eventbook::handlers::event::EventResponse,
            eventbook::handlers::event::CreateEventRequest,
            eventbook::handlers::event::AddItemRequest,
            // Comment
            eventbook::handlers::comment::CommentResponse,
            eventbook::handlers::comment::CreateCommentRequest,
            // Upload
            eventbook::handlers::upload::UploadResponse,
            // Admin
            eventbook::handlers::admin::AdminUserResponse,
            eventbook::handlers::admin::UserListQuery,
            // About
            eventbook::handlers::about::AboutResponse,
        )
    ),
    tags(
        (name = "auth", description = "Authentication operations"),
        (name = "users", description = "User profiles and derived associations"),
        (name = "events", description = "Event management operations"),
        (name = "comments", description = "Comment operations"),
        (name = "uploads", description = "Avatar upload operations"),
        (name = "admin", description = "Administrative operations"),
        (name = "about", description = "About this service"),
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eventbook=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Validate configuration before doing anything else
    let jwt_config = validate_config()?;
    utils::jwt::init_jwt_config(jwt_config)?;

    tracing::info!("Starting Eventbook API v{}...", env!("CARGO_PKG_VERSION"));

    let db = config::database::get_database().await?;
    tracing::info!("Database connected successfully");

    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    services::role::ensure_seed_roles(&db).await?;
    tracing::info!("Role lookup seeded");

    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
    let upload_config = UploadConfig {
        upload_dir: upload_dir.clone(),
    };

    let email_service = EmailService::from_env();
    if email_service.is_configured() {
        tracing::info!("SMTP email service configured");
    } else {
        tracing::warn!("SMTP not configured, emails will be skipped");
    }

    let app = create_app(&upload_dir)
        .layer(Extension(db))
        .layer(Extension(upload_config))
        .layer(Extension(email_service));

    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Validate all required configuration at startup (fail-fast).
fn validate_config() -> anyhow::Result<config::jwt::JwtConfig> {
    // JWT config — validated and cached
    let jwt_config = config::jwt::JwtConfig::from_env()?;

    // DATABASE_URL — checked here for early error; actual connection happens later
    if env::var("DATABASE_URL").is_err() {
        return Err(anyhow::anyhow!(
            "DATABASE_URL environment variable must be set"
        ));
    }

    // Upload directory — create if needed
    let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string());
    std::fs::create_dir_all(&upload_dir).map_err(|e| {
        anyhow::anyhow!("Failed to create upload directory '{}': {}", upload_dir, e)
    })?;

    Ok(jwt_config)
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

fn create_app(upload_dir: &str) -> Router {
    let assets_dir = env::var("ASSETS_DIR").unwrap_or_else(|_| "./static".to_string());

    Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest_service("/uploads", ServeDir::new(upload_dir))
        .nest_service("/assets", ServeDir::new(assets_dir))
        .layer(axum::middleware::from_fn(
            eventbook::middleware::security::security_headers_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Health check successful", body = serde_json::Value)
    )
)]
async fn health_check(Extension(db): Extension<DatabaseConnection>) -> impl IntoResponse {
    let db_ok = db
        .query_one(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "SELECT 1".to_string(),
        ))
        .await
        .is_ok();

    let status = if db_ok { "ok" } else { "degraded" };

    Json(json!({
        "status": status,
        "service": "Eventbook API",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_ok,
    }))
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C signal handler");
    tracing::info!("Shutdown signal received, gracefully shutting down...");
}
