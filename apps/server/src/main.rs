//! Report analyzer server - Main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use actix_web::{App, HttpServer, web};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use report_analyzer_lib::api::{self, ApiDoc};
use report_analyzer_lib::config::Config;
use report_analyzer_lib::db::DbPool;
use report_analyzer_lib::middleware::{RequestLogger, cors};
use report_analyzer_lib::services::{ArtifactStore, Storage};

/// Perform health check (for Docker healthcheck).
async fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Check for --health-check flag (used by Docker HEALTHCHECK)
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(if health_check().await { 0 } else { 1 });
    }

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("  - RUST_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and S3 credentials must be set");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Report Analyzer Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
    }

    let pool = match DbPool::new(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = pool.run_migrations().await {
        error!("{}", e);
        std::process::exit(1);
    }
    info!("Database migrations complete");

    let storage = match Storage::new(&config.storage).await {
        Ok(storage) => storage,
        Err(e) => {
            error!("Failed to initialize artifact storage: {}", e);
            std::process::exit(1);
        }
    };
    let artifacts = ArtifactStore::new(storage, config.max_artifact_size);

    let bind_address = config.bind_address();
    let is_development = config.is_development();
    let max_artifact_size = config.max_artifact_size;

    info!(
        "Artifact uploads limited to {}MB",
        max_artifact_size / 1024 / 1024
    );

    let worker_count = if is_development { 4 } else { num_cpus::get() };
    info!(
        "Starting server at http://{} ({} workers)",
        bind_address, worker_count
    );

    HttpServer::new(move || {
        App::new()
            .wrap(cors(is_development))
            .wrap(RequestLogger)
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(artifacts.clone()))
            // Artifact bodies are read whole; the store enforces the exact limit
            .app_data(web::PayloadConfig::new(max_artifact_size + 1))
            .app_data(web::JsonConfig::default().limit(16 * 1024 * 1024))
            .service(web::scope("/api/v1").configure(api::configure_routes))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .workers(worker_count)
    .bind(&bind_address)?
    .run()
    .await
}
