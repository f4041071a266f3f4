use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::auth::{bearer_token, AuthError};
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::DbId;

/// Caller identity taken from a verified bearer token.
///
/// Handlers that take an `AuthUser` argument are authenticated; the rejection
/// is a 401 envelope naming the failure kind.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub user_id: DbId,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A header that is present but not visible ASCII is a bad scheme, not a missing one
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map_err(|_| AuthError::InvalidScheme))
            .transpose();

        let user_id = header
            .and_then(bearer_token)
            .and_then(|token| state.verifier.verify(token))
            .map_err(|err| {
                tracing::debug!(path = %parts.uri.path(), error = ?err, "Rejected bearer token");
                ApiError::from(err)
            })?;

        Ok(AuthUser { user_id })
    }
}
