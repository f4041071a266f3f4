use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{DbId, DocumentStatus, Visibility};

/// Full `UserDocument` row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: DbId,
    pub user_id: DbId,
    pub title: String,
    pub content_json: String,
    pub thumbnail_path: String,
    pub keywords: String,
    pub link_slug: String,
    pub followers_only: bool,
    pub visibility: String,
    pub document_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn status(&self) -> DocumentStatus {
        DocumentStatus::from(self.document_status.as_str())
    }
}

/// Owner fields joined onto a document fetched by slug
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OwnerProfile {
    pub username: String,
    pub display_name: String,
    pub profile_picture: Option<String>,
}

/// What unauthenticated readers get for `GET /api/doc/:slug`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PublicDocument {
    pub id: DbId,
    pub title: String,
    pub content_json: String,
    pub thumbnail_path: String,
    pub keywords: String,
    pub link_slug: String,
    pub followers_only: bool,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[sqlx(flatten)]
    pub profile: OwnerProfile,
}

/// Owner listing entry (content omitted)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentSummary {
    pub id: DbId,
    pub title: String,
    pub thumbnail_path: String,
    pub keywords: String,
    pub link_slug: String,
    pub followers_only: bool,
    pub visibility: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Document> for DocumentSummary {
    fn from(doc: &Document) -> Self {
        Self {
            id: doc.id,
            title: doc.title.clone(),
            thumbnail_path: doc.thumbnail_path.clone(),
            keywords: doc.keywords.clone(),
            link_slug: doc.link_slug.clone(),
            followers_only: doc.followers_only,
            visibility: doc.visibility.clone(),
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: DbId,
    pub title: String,
    pub content_json: String,
    pub thumbnail_path: String,
    pub keywords: String,
    pub followers_only: bool,
    pub visibility: Visibility,
}

/// Content edit plus optional metadata changes; `None` leaves a field as is
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdate {
    pub doc_id: DbId,
    pub editor_id: DbId,
    pub content_json: String,
    pub title: Option<String>,
    pub thumbnail_path: Option<String>,
    pub keywords: Option<String>,
    pub followers_only: Option<bool>,
    pub visibility: Option<Visibility>,
}
