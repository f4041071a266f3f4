use async_trait::async_trait;

use crate::database::lifecycle::{RestoreStatus, UpdateStatus};
use crate::database::models::{
    Document, DocumentSummary, DocumentUpdate, NewDocument, NewUser, PublicDocument, VersionSummary,
};
use crate::database::DatabaseError;
use crate::types::DbId;

/// Persistence seam shared by the HTTP handlers.
///
/// `PgStore` is the production implementation; `MemoryStore` applies the
/// same lifecycle rules without a database.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert an active document under a freshly generated link slug
    async fn create_document(&self, new: NewDocument) -> Result<Document, DatabaseError>;

    /// Soft-delete the owner's active document; `NotFound` when nothing matched
    async fn delete_document(&self, doc_id: DbId, owner_id: DbId) -> Result<(), DatabaseError>;

    async fn update_document(&self, update: DocumentUpdate) -> Result<UpdateStatus, DatabaseError>;

    async fn restore_version(&self, editor_id: DbId, version_id: DbId) -> Result<RestoreStatus, DatabaseError>;

    /// Active document plus its owner's profile
    async fn document_by_slug(&self, slug: &str) -> Result<PublicDocument, DatabaseError>;

    /// Active documents of one owner, newest first
    async fn documents_by_owner(&self, owner_id: DbId) -> Result<Vec<DocumentSummary>, DatabaseError>;

    /// Versions of a document the caller owns, oldest first
    async fn document_versions(&self, doc_id: DbId, owner_id: DbId) -> Result<Vec<VersionSummary>, DatabaseError>;

    /// Returns false when the user row already existed
    async fn create_user(&self, user: NewUser) -> Result<bool, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError>;
}
