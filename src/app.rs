use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::state::AppState;

/// Build the full HTTP surface around `state`
pub fn app(state: AppState) -> Router {
    let body_limit = state.config.api.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        .merge(public_routes())
        .merge(document_routes())
        .merge(version_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/api/doc/:slug", get(public::document_by_slug))
        .route("/api/events", post(public::receive_event))
        .route("/api/health", get(public::health))
}

fn document_routes() -> Router<AppState> {
    Router::new()
        .route("/api/user-doc", get(protected::documents_by_owner))
        .route("/api/create-doc", post(protected::create_document))
        .route("/api/update-doc/:id", put(protected::update_document))
        .route("/api/delete-doc/:id", delete(protected::delete_document))
}

fn version_routes() -> Router<AppState> {
    Router::new()
        .route("/api/list-doc-versions/:id", get(protected::document_versions))
        // Existing clients post with the trailing slash
        .route("/api/restore-version/", post(protected::restore_version))
        .route("/api/restore-version", post(protected::restore_version))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins = if security.cors_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        let parsed: Vec<HeaderValue> = security
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %origin, "Skipping unparseable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(parsed)
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::ORIGIN, header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
}
