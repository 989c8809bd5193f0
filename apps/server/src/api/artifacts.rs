//! Artifact API handlers.
//!
//! Uploads packet captures and key logs to the artifact store and links them
//! to a container, or streams a linked artifact back.

use actix_web::{HttpResponse, web};
use tracing::{debug, error};
use uuid::Uuid;

use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::{ArtifactKind, StoredArtifactResponse, TestResultContainer};
use crate::services::{ArtifactStore, Storage};

fn parse_kind(kind: &str) -> AppResult<ArtifactKind> {
    ArtifactKind::parse(kind).ok_or_else(|| {
        AppError::InvalidInput(format!(
            "Unknown artifact kind '{}', expected 'pcap' or 'keylog'",
            kind
        ))
    })
}

fn linked_storage_id(container: &TestResultContainer, kind: ArtifactKind) -> Option<Uuid> {
    match kind {
        ArtifactKind::Pcap => container.pcap_storage_id,
        ArtifactKind::Keylog => container.keylogfile_storage_id,
    }
}

/// Log an artifact that was stored but could not be linked, then pass the error on.
fn orphaned(container_id: Uuid, kind: ArtifactKind, storage_id: Uuid, e: AppError) -> AppError {
    error!(
        container_id = %container_id,
        kind = %kind,
        storage_id = %storage_id,
        key = %Storage::artifact_key(kind.as_str(), &storage_id.to_string()),
        error = %e,
        "Stored artifact is orphaned: linking it to the container failed"
    );
    e
}

/// Upload an artifact and link it to the container.
///
/// Replaces an existing link of the same kind; the old artifact stays in the store.
#[utoipa::path(
    put,
    path = "/test-result-containers/{container_id}/artifacts/{kind}",
    tag = "Artifacts",
    params(
        ("container_id" = Uuid, Path, description = "Container ID"),
        ("kind" = ArtifactKind, Path, description = "Artifact kind")
    ),
    request_body(content = Vec<u8>, content_type = "application/octet-stream"),
    responses(
        (status = 201, description = "Artifact stored and linked", body = StoredArtifactResponse),
        (status = 400, description = "Unknown kind, empty or oversized upload", body = crate::error::ErrorResponse),
        (status = 404, description = "Container not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn upload_artifact(
    pool: web::Data<DbPool>,
    store: web::Data<ArtifactStore>,
    path: web::Path<(Uuid, String)>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    let (container_id, kind) = path.into_inner();
    let kind = parse_kind(&kind)?;

    if pool.get_test_result_container(container_id).await?.is_none() {
        return Err(AppError::NotFound(format!(
            "Test result container {}",
            container_id
        )));
    }

    let size = body.len();
    let storage_id = store.store(kind, body.to_vec()).await?;
    pool.set_artifact(container_id, kind, storage_id)
        .await
        .map_err(|e| orphaned(container_id, kind, storage_id, e))?;

    Ok(HttpResponse::Created().json(StoredArtifactResponse {
        container_id,
        kind,
        storage_id,
        size,
    }))
}

/// Download the artifact linked to a container.
#[utoipa::path(
    get,
    path = "/test-result-containers/{container_id}/artifacts/{kind}",
    tag = "Artifacts",
    params(
        ("container_id" = Uuid, Path, description = "Container ID"),
        ("kind" = ArtifactKind, Path, description = "Artifact kind")
    ),
    responses(
        (status = 200, description = "Artifact content", content_type = "application/octet-stream"),
        (status = 404, description = "Container or artifact not found", body = crate::error::ErrorResponse),
    )
)]
pub async fn download_artifact(
    pool: web::Data<DbPool>,
    store: web::Data<ArtifactStore>,
    path: web::Path<(Uuid, String)>,
) -> AppResult<HttpResponse> {
    let (container_id, kind) = path.into_inner();
    let kind = parse_kind(&kind)?;

    let container = pool
        .get_test_result_container(container_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Test result container {}", container_id)))?;

    let storage_id = linked_storage_id(&container, kind).ok_or_else(|| {
        AppError::NotFound(format!("{} artifact of container {}", kind, container_id))
    })?;

    if !store.exists(kind, storage_id).await? {
        return Err(AppError::NotFound(format!(
            "{} artifact {} is missing from the store",
            kind, storage_id
        )));
    }

    debug!(container_id = %container_id, kind = %kind, storage_id = %storage_id, "Serving artifact");

    let data = store.fetch(kind, storage_id).await?;

    Ok(HttpResponse::Ok()
        .content_type(kind.content_type())
        .insert_header((
            "Content-Disposition",
            format!(
                "attachment; filename=\"{}\"",
                kind.file_name(&container.identifier)
            ),
        ))
        .body(data))
}

/// Configure artifact routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/test-result-containers/{container_id}/artifacts/{kind}")
            .route(web::get().to(download_artifact))
            .route(web::put().to(upload_artifact)),
    );
}
