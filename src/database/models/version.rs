use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::DbId;

/// Immutable content snapshot taken on every successful update or restore
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentVersion {
    pub id: DbId,
    pub document_id: DbId,
    pub edited_by_user_id: DbId,
    pub version_number: i32,
    pub content_json: String,
    pub created_at: DateTime<Utc>,
}

/// Version listing entry; content is fetched only on restore
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct VersionSummary {
    pub id: DbId,
    pub version_number: i32,
    pub edited_by_user_id: DbId,
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentVersion> for VersionSummary {
    fn from(version: &DocumentVersion) -> Self {
        Self {
            id: version.id,
            version_number: version.version_number,
            edited_by_user_id: version.edited_by_user_id,
            created_at: version.created_at,
        }
    }
}
