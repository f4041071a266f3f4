// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) → Protected (bearer token via the `AuthUser` extractor)
pub mod protected;
pub mod public;

use crate::error::ApiError;
use crate::types::DbId;

/// Parse a numeric path id, rejecting zero and negatives
pub(crate) fn parse_id(raw: &str) -> Result<DbId, ApiError> {
    raw.trim()
        .parse::<DbId>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request("Invalid document id"))
}
