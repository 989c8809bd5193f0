//! OpenAPI documentation configuration.

use utoipa::OpenApi;

use crate::{api, error, models};

/// OpenAPI documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Report Analyzer Server",
        version = "0.1.0",
        description = "API server storing aggregated TLS test run results, scores and capture artifacts"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    ),
    paths(
        // Health endpoints
        api::health::health,
        api::health::ready,
        // Container endpoints
        api::test_result_containers::create_container,
        api::test_result_containers::create_aggregated_container,
        api::test_result_containers::list_containers,
        api::test_result_containers::get_container,
        api::test_result_containers::update_container,
        api::test_result_containers::reaggregate_container,
        api::test_result_containers::delete_container,
        // Artifact endpoints
        api::artifacts::upload_artifact,
        api::artifacts::download_artifact,
    ),
    components(
        schemas(
            // Common
            error::ErrorResponse,
            // Health
            api::health::HealthResponse,
            api::health::ReadyResponse,
            // Containers
            models::Score,
            models::ScoreCategory,
            models::TestResultContainer,
            models::NewTestResultContainer,
            models::UpdateTestResultContainer,
            models::TestResultContainerListResponse,
            models::ListTestResultContainersQuery,
            api::test_result_containers::AggregateContainerRequest,
            // Test results
            models::TestStatus,
            models::SeverityLevel,
            models::TestResultSummary,
            // Artifacts
            models::ArtifactKind,
            models::StoredArtifactResponse,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoints"),
        (name = "Test Result Containers", description = "Aggregated test run results"),
        (name = "Artifacts", description = "Packet capture and key log artifacts")
    )
)]
pub struct ApiDoc;
