use axum::extract::{rejection::JsonRejection, Path, State};
use axum::Json;
use serde::Deserialize;

use crate::database::models::{Document, DocumentSummary, DocumentUpdate, NewDocument};
use crate::database::lifecycle::UpdateStatus;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::handlers::parse_id;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;
use crate::types::Visibility;

#[derive(Debug, Deserialize)]
pub struct CreateDocumentRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content_json: String,
    #[serde(default)]
    pub thumbnail_path: String,
    #[serde(default)]
    pub keywords: String,
    #[serde(default)]
    pub followers_only: bool,
    #[serde(default)]
    pub visibility: Option<String>,
}

/// Content replacement plus optional metadata; omitted fields stay unchanged
#[derive(Debug, Deserialize)]
pub struct UpdateDocumentRequest {
    #[serde(default)]
    pub content_json: String,
    pub title: Option<String>,
    pub thumbnail_path: Option<String>,
    pub keywords: Option<String>,
    pub followers_only: Option<bool>,
    pub visibility: Option<String>,
}

fn require_content(content_json: &str) -> Result<(), ApiError> {
    if content_json.trim().is_empty() {
        return Err(ApiError::field_error(
            "Missing required fields",
            "content_json",
            "This field is required",
        ));
    }
    Ok(())
}

fn parse_visibility(raw: Option<&str>) -> Result<Option<Visibility>, ApiError> {
    raw.map(|value| {
        value
            .parse::<Visibility>()
            .map_err(|reason| ApiError::field_error("Invalid visibility", "visibility", reason))
    })
    .transpose()
}

/// POST /api/create-doc - create a document owned by the caller
pub async fn create_document(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<CreateDocumentRequest>, JsonRejection>,
) -> ApiResult<Document> {
    let Json(request) = payload?;
    require_content(&request.content_json)?;
    let visibility = parse_visibility(request.visibility.as_deref())?.unwrap_or_default();

    let document = state
        .store
        .create_document(NewDocument {
            user_id: user.user_id,
            title: request.title,
            content_json: request.content_json,
            thumbnail_path: request.thumbnail_path,
            keywords: request.keywords,
            followers_only: request.followers_only,
            visibility,
        })
        .await
        .map_err(|e| match e {
            DatabaseError::Constraint(reason) => {
                tracing::warn!(user_id = user.user_id, "Create rejected: {}", reason);
                ApiError::internal_server_error("Failed to create document")
            }
            other => other.into(),
        })?;

    Ok(ApiResponse::created("Document created successfully", document))
}

/// PUT /api/update-doc/:id - replace content and snapshot a new version
pub async fn update_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDocumentRequest>, JsonRejection>,
) -> ApiResult<()> {
    let doc_id = parse_id(&id)?;
    let Json(request) = payload?;
    require_content(&request.content_json)?;
    let visibility = parse_visibility(request.visibility.as_deref())?;

    let outcome = state
        .store
        .update_document(DocumentUpdate {
            doc_id,
            editor_id: user.user_id,
            content_json: request.content_json,
            title: request.title,
            thumbnail_path: request.thumbnail_path,
            keywords: request.keywords,
            followers_only: request.followers_only,
            visibility,
        })
        .await?;

    tracing::info!(doc_id, user_id = user.user_id, outcome = outcome.as_str(), "Update processed");

    match outcome {
        UpdateStatus::Success => Ok(ApiResponse::message("Document updated successfully")),
        UpdateStatus::NotFound => Err(ApiError::not_found("Document not found")),
        UpdateStatus::Unauthorized => Err(ApiError::forbidden("Unauthorized to update this document")),
        UpdateStatus::Inactive => Err(ApiError::bad_request("Document is inactive")),
    }
}

/// DELETE /api/delete-doc/:id - soft delete one of the caller's documents
pub async fn delete_document(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let doc_id = parse_id(&id)?;

    match state.store.delete_document(doc_id, user.user_id).await {
        Ok(()) => {
            tracing::info!(doc_id, user_id = user.user_id, "Document deleted");
            Ok(ApiResponse::message("Document Deleted Successfully"))
        }
        Err(DatabaseError::NotFound(_)) => Err(ApiError::not_found("File doesn't exist")),
        Err(e) => Err(e.into()),
    }
}

/// GET /api/user-doc - the caller's active documents, newest first
pub async fn documents_by_owner(State(state): State<AppState>, user: AuthUser) -> ApiResult<Vec<DocumentSummary>> {
    let documents = state.store.documents_by_owner(user.user_id).await?;

    let message = if documents.is_empty() {
        "No documents found for this user"
    } else {
        "Documents retrieved successfully"
    };
    Ok(ApiResponse::success(message, documents))
}
