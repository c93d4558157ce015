use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes())
}

fn api_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let public_read = public_read_routes(&rate_limit_config);
    let protected =
        protected_routes(&rate_limit_config).layer(middleware::from_fn(auth_middleware));

    auth.merge(public_read).merge(protected)
}

/// Auth routes: register, login, password reset.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/auth/register", routing::post(handlers::register))
        .route("/auth/login", routing::post(handlers::login))
        .route(
            "/auth/refresh",
            routing::post(handlers::auth::refresh_token),
        )
        .route(
            "/auth/forgot-password",
            routing::post(handlers::auth::forgot_password),
        )
        .route(
            "/auth/reset-password",
            routing::post(handlers::auth::reset_password),
        );

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Public read routes.
fn public_read_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // About
        .route("/about", routing::get(handlers::about::about))
        // Users
        .route(
            "/users/{name}",
            routing::get(handlers::user::get_user_profile),
        )
        .route(
            "/users/{name}/events",
            routing::get(handlers::user::list_user_events),
        )
        .route(
            "/users/{name}/items",
            routing::get(handlers::user::list_user_items),
        )
        .route(
            "/users/{name}/commented-events",
            routing::get(handlers::user::list_commented_events),
        )
        .route(
            "/users/{name}/commented-users",
            routing::get(handlers::user::list_commented_users),
        )
        .route(
            "/users/{name}/comments",
            routing::get(handlers::comment::list_user_comments),
        )
        // Events
        .route("/events", routing::get(handlers::event::list_events))
        .route("/events/{id}", routing::get(handlers::event::get_event))
        .route(
            "/events/{id}/items",
            routing::get(handlers::event::list_items),
        )
        .route(
            "/events/{id}/comments",
            routing::get(handlers::comment::list_event_comments),
        );

    with_optional_rate_limit(router, config.enabled, config.public_read)
}

/// Protected routes: all authenticated writes.
fn protected_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        // Auth
        .route("/auth/me", routing::get(handlers::get_current_user))
        .route("/auth/logout", routing::post(handlers::auth::logout))
        .route(
            "/auth/profile",
            routing::put(handlers::user::update_profile),
        )
        .route("/auth/password", routing::put(handlers::change_password))
        // Events
        .route("/events", routing::post(handlers::event::create_event))
        .route(
            "/events/{id}",
            routing::put(handlers::event::update_event).delete(handlers::event::delete_event),
        )
        .route(
            "/events/{id}/items",
            routing::post(handlers::event::add_item),
        )
        .route(
            "/events/{id}/items/{item_id}",
            routing::delete(handlers::event::remove_item),
        )
        // Comments
        .route(
            "/events/{id}/comments",
            routing::post(handlers::comment::create_event_comment),
        )
        .route(
            "/users/{name}/comments",
            routing::post(handlers::comment::create_user_comment),
        )
        .route(
            "/comments/{id}",
            routing::delete(handlers::comment::delete_comment),
        )
        // Upload
        .route(
            "/upload/avatar",
            routing::post(handlers::upload::upload_avatar),
        )
        // Admin
        .route("/admin/users", routing::get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}/toggle-active",
            routing::put(handlers::admin::toggle_user_active),
        )
        .route(
            "/admin/users/{id}",
            routing::delete(handlers::admin::destroy_user),
        );

    with_optional_rate_limit(router, config.enabled, config.protected)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
