use axum::extract::{Path, State};

use crate::database::models::PublicDocument;
use crate::database::slug::is_valid_slug;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

/// GET /api/doc/:slug - fetch an active document and its owner's profile
pub async fn document_by_slug(State(state): State<AppState>, Path(slug): Path<String>) -> ApiResult<PublicDocument> {
    if !is_valid_slug(&slug) {
        return Err(ApiError::bad_request("Invalid document id"));
    }

    match state.store.document_by_slug(&slug).await {
        Ok(document) => Ok(ApiResponse::success("Document retrieved successfully", document)),
        Err(DatabaseError::NotFound(_)) => {
            tracing::debug!(slug = %slug, "No active document for slug");
            Err(ApiError::not_found("File doesn't exist"))
        }
        Err(e) => Err(e.into()),
    }
}
