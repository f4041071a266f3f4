use axum::extract::{rejection::JsonRejection, State};
use axum::Json;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::user_events::{EventError, UserEvent, UserEventService, USER_LOGIN, USER_REGISTERED};
use crate::state::AppState;

/// POST /api/events - apply a user-lifecycle event from the identity system
pub async fn receive_event(
    State(state): State<AppState>,
    payload: Result<Json<UserEvent>, JsonRejection>,
) -> ApiResult<()> {
    let Json(event) = payload.map_err(|rejection| {
        tracing::warn!("Rejected event body: {}", rejection.body_text());
        ApiError::field_error("Invalid JSON", "body", rejection.body_text())
    })?;

    let event_type = event.event_type.clone();
    UserEventService::new(state.store.clone())
        .process(event)
        .await
        .map_err(|err| event_error(&event_type, err))?;

    Ok(ApiResponse::message("Event processed successfully"))
}

fn event_error(event_type: &str, err: EventError) -> ApiError {
    tracing::error!(event_type, error = %err, "Failed to process event");

    let message = match event_type {
        USER_REGISTERED => "Failed to process user registration",
        USER_LOGIN => "Failed to process user login",
        _ => "Failed to process event",
    };

    match err {
        EventError::InvalidPayload { .. } => ApiError::internal_with_detail(message, err.to_string()),
        EventError::Database(db_err) => match ApiError::from(db_err) {
            ApiError::InternalServerError { detail, .. } => ApiError::InternalServerError {
                message: message.to_string(),
                detail,
            },
            other => other,
        },
    }
}
