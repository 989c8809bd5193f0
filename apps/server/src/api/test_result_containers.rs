//! Test result container API handlers.

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{
    ListTestResultContainersQuery, NewTestResultContainer, TestResultContainer,
    TestResultContainerListResponse, TestResultSummary, UpdateTestResultContainer,
};
use crate::services::aggregation::ContainerAggregate;

/// Create a container whose counters and scores are computed from test results.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct AggregateContainerRequest {
    /// Container fields; counters, `TestResults`, index map and `Score` are overwritten.
    pub container: NewTestResultContainer,
    /// Test results in execution order.
    pub summaries: Vec<TestResultSummary>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Test result container {}", id))
}

/// Create a test result container.
///
/// Nested `TestClasses` are stored with it. `Score` percentages are derived
/// from `Reached` and `Total`.
#[utoipa::path(
    post,
    path = "/test-result-containers",
    tag = "Test Result Containers",
    request_body = NewTestResultContainer,
    responses(
        (status = 201, description = "Container created", body = TestResultContainer),
        (status = 400, description = "Missing Identifier or invalid field", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_container(
    pool: web::Data<DbPool>,
    body: web::Json<NewTestResultContainer>,
) -> AppResult<HttpResponse> {
    let container = pool.insert_test_result_container(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(container))
}

/// Create a container from test result summaries.
#[utoipa::path(
    post,
    path = "/test-result-containers/aggregate",
    tag = "Test Result Containers",
    request_body = AggregateContainerRequest,
    responses(
        (status = 201, description = "Container created", body = TestResultContainer),
        (status = 400, description = "Missing Identifier or invalid field", body = crate::error::ErrorResponse),
    )
)]
pub async fn create_aggregated_container(
    pool: web::Data<DbPool>,
    body: web::Json<AggregateContainerRequest>,
) -> AppResult<HttpResponse> {
    let AggregateContainerRequest {
        mut container,
        summaries,
    } = body.into_inner();

    ContainerAggregate::from_summaries(&summaries).apply_to(&mut container);

    let container = pool.insert_test_result_container(container).await?;
    Ok(HttpResponse::Created().json(container))
}

/// List top-level containers, or look them up by one indexed field.
#[utoipa::path(
    get,
    path = "/test-result-containers",
    tag = "Test Result Containers",
    params(
        ("identifier" = Option<String>, Query, description = "Exact Identifier match"),
        ("pcap_storage_id" = Option<Uuid>, Query, description = "Exact PcapStorageId match"),
        ("keylogfile_storage_id" = Option<Uuid>, Query, description = "Exact KeylogfileStorageId match"),
        ("limit" = Option<u64>, Query, description = "Results per page (default 20, max 100)"),
        ("offset" = Option<u64>, Query, description = "Pagination offset")
    ),
    responses(
        (status = 200, description = "Matching containers", body = TestResultContainerListResponse),
        (status = 400, description = "More than one lookup filter", body = crate::error::ErrorResponse),
    )
)]
pub async fn list_containers(
    pool: web::Data<DbPool>,
    query: web::Query<ListTestResultContainersQuery>,
) -> AppResult<HttpResponse> {
    let response = match query.lookup()? {
        Some(lookup) => {
            let containers = pool.find_test_result_containers(&lookup).await?;
            let total = containers.len() as u64;
            TestResultContainerListResponse {
                containers,
                total,
                limit: total,
                offset: 0,
            }
        }
        None => {
            let (containers, total) = pool
                .list_test_result_containers(query.limit(), query.offset())
                .await?;
            TestResultContainerListResponse {
                containers,
                total,
                limit: query.limit(),
                offset: query.offset(),
            }
        }
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Get a container by ID, including nested test classes.
#[utoipa::path(
    get,
    path = "/test-result-containers/{container_id}",
    tag = "Test Result Containers",
    params(
        ("container_id" = Uuid, Path, description = "Container ID")
    ),
    responses(
        (status = 200, description = "Container", body = TestResultContainer),
        (status = 404, description = "Container not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn get_container(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let container = pool
        .get_test_result_container(id)
        .await?
        .ok_or_else(|| not_found(id))?;

    Ok(HttpResponse::Ok().json(container))
}

/// Update fields of a container.
#[utoipa::path(
    patch,
    path = "/test-result-containers/{container_id}",
    tag = "Test Result Containers",
    params(
        ("container_id" = Uuid, Path, description = "Container ID")
    ),
    request_body = UpdateTestResultContainer,
    responses(
        (status = 200, description = "Updated container", body = TestResultContainer),
        (status = 400, description = "Invalid field or empty update", body = crate::error::ErrorResponse),
        (status = 404, description = "Container not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn update_container(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateTestResultContainer>,
) -> AppResult<HttpResponse> {
    let container = pool
        .update_test_result_container(path.into_inner(), body.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(container))
}

/// Recompute counters, test result references and scores.
#[utoipa::path(
    put,
    path = "/test-result-containers/{container_id}/aggregate",
    tag = "Test Result Containers",
    params(
        ("container_id" = Uuid, Path, description = "Container ID")
    ),
    request_body = Vec<TestResultSummary>,
    responses(
        (status = 200, description = "Re-aggregated container", body = TestResultContainer),
        (status = 404, description = "Container not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn reaggregate_container(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
    body: web::Json<Vec<TestResultSummary>>,
) -> AppResult<HttpResponse> {
    let aggregate = ContainerAggregate::from_summaries(&body);
    let container = pool.apply_aggregate(path.into_inner(), aggregate).await?;

    Ok(HttpResponse::Ok().json(container))
}

/// Delete a container and its nested test classes.
#[utoipa::path(
    delete,
    path = "/test-result-containers/{container_id}",
    tag = "Test Result Containers",
    params(
        ("container_id" = Uuid, Path, description = "Container ID")
    ),
    responses(
        (status = 204, description = "Container deleted"),
        (status = 404, description = "Container not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn delete_container(
    pool: web::Data<DbPool>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    if !pool.delete_test_result_container(id).await? {
        return Err(not_found(id));
    }

    Ok(HttpResponse::NoContent().finish())
}

/// Configure test result container routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/test-result-containers")
            .route(web::get().to(list_containers))
            .route(web::post().to(create_container)),
    )
    .service(
        web::resource("/test-result-containers/aggregate")
            .route(web::post().to(create_aggregated_container)),
    )
    .service(
        web::resource("/test-result-containers/{container_id}")
            .route(web::get().to(get_container))
            .route(web::patch().to(update_container))
            .route(web::delete().to(delete_container)),
    )
    .service(
        web::resource("/test-result-containers/{container_id}/aggregate")
            .route(web::put().to(reaggregate_container)),
    );
}
