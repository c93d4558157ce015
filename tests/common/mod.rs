#![allow(dead_code)]

use reqwest::Client;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use sea_orm_migration::MigratorTrait;
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Once, OnceLock,
};
use tokio::sync::{Mutex, OwnedMutexGuard};

static INIT: Once = Once::new();
static MIGRATIONS_RAN: AtomicBool = AtomicBool::new(false);
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Tests share one database; each test holds this lock for its lifetime so
/// the per-test table cleanup cannot race a test in flight.
static DB_LOCK: OnceLock<Arc<Mutex<()>>> = OnceLock::new();

async fn acquire_db_lock() -> OwnedMutexGuard<()> {
    DB_LOCK
        .get_or_init(|| Arc::new(Mutex::new(())))
        .clone()
        .lock_owned()
        .await
}

fn init_env() {
    INIT.call_once(|| {
        dotenv::dotenv().ok();
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = eventbook::config::jwt::JwtConfig::from_env().unwrap();
        let _ = eventbook::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub db: DatabaseConnection,
    pub client: Client,
    _db_lock: OwnedMutexGuard<()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }
}

pub async fn spawn_app() -> TestApp {
    init_env();
    let db_lock = acquire_db_lock().await;

    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"));

    let db = sea_orm::Database::connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    // Run migrations only once globally
    if !MIGRATIONS_RAN.swap(true, Ordering::SeqCst) {
        eventbook::migration::Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");
    }

    // Clean data tables (reverse dependency order); roles stay seeded
    cleanup_tables(&db).await;

    eventbook::services::role::ensure_seed_roles(&db)
        .await
        .expect("Failed to seed roles");

    let upload_config = eventbook::services::upload::UploadConfig {
        upload_dir: "./test_uploads".to_string(),
    };
    let email_service = eventbook::services::email::EmailService::from_env();

    let app = axum::Router::new()
        .route("/", axum::routing::get(|| async { "ok" }))
        .merge(eventbook::routes::create_routes())
        .layer(axum::middleware::from_fn(
            eventbook::middleware::security::security_headers_middleware,
        ))
        .layer(axum::extract::Extension(db.clone()))
        .layer(axum::extract::Extension(upload_config))
        .layer(axum::extract::Extension(email_service));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        db,
        client: Client::new(),
        _db_lock: db_lock,
    }
}

async fn cleanup_tables(db: &DatabaseConnection) {
    let tables = ["refresh_tokens", "comments", "items", "events", "users"];

    for table in tables {
        let sql = format!("TRUNCATE TABLE {} CASCADE", table);
        let _ = db
            .execute(Statement::from_string(
                sea_orm::DatabaseBackend::Postgres,
                sql,
            ))
            .await;
    }
}

/// Register a user and return (user_id, token, stored_name).
/// Keep prefixes short: stored names must stay within 16 characters.
pub async fn create_test_user(app: &TestApp, prefix: &str) -> (i32, String, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let name = format!("{} {}", prefix, counter);

    let resp = app
        .client
        .post(app.url("/auth/register"))
        .json(&serde_json::json!({
            "name": name,
            "email": format!("{}{}@test.com", prefix, counter),
            "password": "test_password_123"
        }))
        .send()
        .await
        .expect("Failed to register user");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.unwrap_or_else(|e| {
        panic!(
            "Failed to parse register response for '{}': status={}, error={}",
            name, status, e
        );
    });

    if !body["success"].as_bool().unwrap_or(false) {
        panic!(
            "Failed to register user '{}': status={}, body={}",
            name, status, body
        );
    }

    let user_id = body["data"]["user_id"].as_i64().expect("missing user_id") as i32;
    let token = body["data"]["token"]
        .as_str()
        .expect("missing token")
        .to_string();
    let stored_name = body["data"]["name"]
        .as_str()
        .expect("missing name")
        .to_string();
    (user_id, token, stored_name)
}

/// Promote a user to the admin role directly in the database.
pub async fn make_admin(db: &DatabaseConnection, user_id: i32) {
    db.execute(Statement::from_sql_and_values(
        sea_orm::DatabaseBackend::Postgres,
        "UPDATE users SET role_id = (SELECT id FROM roles WHERE code = 'admin') WHERE id = $1",
        vec![user_id.into()],
    ))
    .await
    .expect("Failed to make user admin");
}

/// Create an event owned by the token's user and return its id.
pub async fn create_test_event(app: &TestApp, token: &str, title: &str) -> i32 {
    let resp = app
        .client
        .post(app.url("/events"))
        .bearer_auth(token)
        .json(&serde_json::json!({
            "title": title,
            "description": "A test event"
        }))
        .send()
        .await
        .expect("Failed to create event");

    let status = resp.status();
    let body: serde_json::Value = resp.json().await.expect("Failed to parse event response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to create event: status={}, body={}", status, body);
    }

    body["data"]["id"].as_i64().expect("missing event id") as i32
}
