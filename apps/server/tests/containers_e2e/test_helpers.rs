//! Shared test helpers for container E2E tests.

use actix_web::{App, dev::ServiceResponse, test, web};
use report_analyzer_lib::api;
use report_analyzer_lib::config::Config;
use report_analyzer_lib::db::DbPool;
use serde_json::Value;
use std::sync::OnceLock;
use uuid::Uuid;

static MIGRATIONS_RUN: OnceLock<()> = OnceLock::new();

/// Create a fresh DB pool. Migrations run only once.
///
/// Returns `None` when `DATABASE_URL` is unset after loading `.env`.
/// A configured but unreachable database panics.
pub async fn create_test_pool() -> Option<DbPool> {
    dotenvy::dotenv().ok();
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL is not set, skipping database-backed test");
        return None;
    }

    let mut config = Config::from_env().expect(
        "Failed to load config. Ensure RUST_ENV and DATABASE_URL are set, \
         and that PostgreSQL is running.",
    );
    config.database.max_connections = 2;
    config.database.min_connections = 1;

    let pool = DbPool::new(&config)
        .await
        .expect("Failed to connect to database");

    if MIGRATIONS_RUN.get().is_none() {
        pool.run_migrations()
            .await
            .expect("Failed to run migrations");
        let _ = MIGRATIONS_RUN.set(());
    }

    Some(pool)
}

/// Generate a unique identifier for test isolation.
pub fn unique_identifier(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

/// Create a test app serving the container routes.
pub async fn create_test_app(
    pool: &DbPool,
) -> impl actix_web::dev::Service<
    actix_http::Request,
    Response = ServiceResponse,
    Error = actix_web::Error,
> {
    test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .service(
                web::scope("/api/v1")
                    .configure(api::configure_container_routes),
            ),
    )
    .await
}

/// Send a JSON request and return status and parsed body.
pub async fn send_json<S>(app: &S, req: test::TestRequest) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let bytes = test::read_body(resp).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Response body is not JSON")
    };
    (status, body)
}

/// Create a container and assert success.
pub async fn create_container<S>(app: &S, body: Value) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::post()
        .uri("/api/v1/test-result-containers")
        .set_json(body);
    let (status, body) = send_json(app, req).await;
    assert_eq!(status, 201, "Create should succeed: {:?}", body);
    body
}

/// Get a container by ID.
pub async fn get_container<S>(app: &S, id: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::get().uri(&format!("/api/v1/test-result-containers/{}", id));
    send_json(app, req).await
}

/// List containers with a raw query string.
pub async fn list_containers<S>(app: &S, query: &str) -> (u16, Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let req = test::TestRequest::get().uri(&format!("/api/v1/test-result-containers?{}", query));
    send_json(app, req).await
}
