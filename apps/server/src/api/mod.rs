//! API endpoint modules.

pub mod artifacts;
pub mod health;
pub mod openapi;
pub mod test_result_containers;

pub use artifacts::configure_routes as configure_artifact_routes;
pub use health::configure_health_routes;
pub use openapi::ApiDoc;
pub use test_result_containers::configure_routes as configure_container_routes;

use actix_web::web;

/// Configure every `/api/v1` route.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(configure_health_routes)
        .configure(configure_container_routes)
        .configure(configure_artifact_routes);
}
