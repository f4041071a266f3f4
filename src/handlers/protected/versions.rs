use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use serde::Deserialize;

use crate::config::RestoreStatusMapping;
use crate::database::lifecycle::RestoreStatus;
use crate::database::models::VersionSummary;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::DbId;

#[derive(Debug, Deserialize)]
pub struct RestoreVersionRequest {
    #[serde(default)]
    pub version_id: Option<DbId>,
}

/// GET /api/list-doc-versions/:id - versions of one of the caller's documents
pub async fn document_versions(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Vec<VersionSummary>> {
    let doc_id = parse_id(&id)?;
    let versions = state.store.document_versions(doc_id, user.user_id).await?;
    Ok(ApiResponse::success("Versions retrieved successfully", versions))
}

/// POST /api/restore-version/ - copy a version's content back into its document
pub async fn restore_version(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<RestoreVersionRequest>, JsonRejection>,
) -> ApiResult<()> {
    let Json(request) = payload?;
    let version_id = request.version_id.filter(|id| *id > 0).ok_or_else(|| {
        ApiError::field_error("Missing required fields", "version_id", "Must be a positive integer")
    })?;

    let outcome = state.store.restore_version(user.user_id, version_id).await?;
    tracing::info!(version_id, user_id = user.user_id, outcome = outcome.as_str(), "Restore processed");

    restore_outcome(outcome, state.config.api.restore_status_mapping)
}

fn restore_outcome(outcome: RestoreStatus, mapping: RestoreStatusMapping) -> ApiResult<()> {
    match (outcome, mapping) {
        (RestoreStatus::Success, _) => Ok(ApiResponse::message("Document Restored successfully")),
        (RestoreStatus::RestoreFailed, _) => Err(ApiError::not_found("Restore failed")),
        (RestoreStatus::DocumentInactive, _) => Err(ApiError::forbidden("Document is inactive")),
        (RestoreStatus::Unauthorized, RestoreStatusMapping::Legacy) => {
            Err(ApiError::bad_gateway("Unauthorized to update this document"))
        }
        (RestoreStatus::Unauthorized, RestoreStatusMapping::Strict) => {
            Err(ApiError::forbidden("Unauthorized to update this document"))
        }
        (RestoreStatus::VersionNotFound, RestoreStatusMapping::Legacy) => {
            Err(ApiError::internal_server_error("Document version not found"))
        }
        (RestoreStatus::VersionNotFound, RestoreStatusMapping::Strict) => {
            Err(ApiError::not_found("Document version not found"))
        }
    }
}
