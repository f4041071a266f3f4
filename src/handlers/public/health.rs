use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::middleware::Envelope;
use crate::state::AppState;

const SERVICE_NAME: &str = "docshelf-api";

/// GET /api/health - liveness plus a store ping
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timestamp = chrono::Utc::now().to_rfc3339();

    match state.store.health_check().await {
        Ok(()) => Envelope::success(
            "Service is healthy",
            json!({
                "service": SERVICE_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": timestamp,
                "database": "ok",
            }),
        )
        .into_response_with(StatusCode::OK),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            Envelope::error("Database unavailable", json!(null))
                .with_data(json!({
                    "service": SERVICE_NAME,
                    "version": env!("CARGO_PKG_VERSION"),
                    "timestamp": timestamp,
                    "database": "unavailable",
                }))
                .into_response_with(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
