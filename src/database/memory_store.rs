use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::database::lifecycle::{
    check_restore, check_update, next_version_number, DocumentState, RestoreStatus, UpdateStatus,
};
use crate::database::models::{
    Document, DocumentSummary, DocumentUpdate, DocumentVersion, NewDocument, NewUser, OwnerProfile,
    PublicDocument, UserProfile, VersionSummary,
};
use crate::database::slug::{generate_slug, MAX_SLUG_ATTEMPTS};
use crate::database::store::DocumentStore;
use crate::database::DatabaseError;
use crate::types::{DbId, DocumentStatus};

#[derive(Default)]
struct Tables {
    users: HashMap<DbId, UserProfile>,
    documents: BTreeMap<DbId, Document>,
    versions: Vec<DocumentVersion>,
    last_document_id: DbId,
    last_version_id: DbId,
}

impl Tables {
    fn state_of(&self, doc_id: DbId) -> Option<DocumentState> {
        self.documents.get(&doc_id).map(|doc| DocumentState {
            owner_id: doc.user_id,
            status: doc.status(),
        })
    }

    fn append_version(&mut self, doc_id: DbId, editor_id: DbId, content_json: &str) -> i32 {
        let current_max = self
            .versions
            .iter()
            .filter(|v| v.document_id == doc_id)
            .map(|v| v.version_number)
            .max();
        let version_number = next_version_number(current_max);

        self.last_version_id += 1;
        self.versions.push(DocumentVersion {
            id: self.last_version_id,
            document_id: doc_id,
            edited_by_user_id: editor_id,
            version_number,
            content_json: content_json.to_string(),
            created_at: Utc::now(),
        });
        version_number
    }
}

/// Process-local store with the same rules as `PgStore`.
///
/// Backs `serve --in-memory` and the integration tests. One write lock per
/// call gives the same serialisation the row lock gives in Postgres.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(&self, new: NewDocument) -> Result<Document, DatabaseError> {
        let mut tables = self.tables.write().await;

        if !tables.users.contains_key(&new.user_id) {
            return Err(DatabaseError::Constraint(format!(
                "user {} does not exist in UserRelatedData",
                new.user_id
            )));
        }

        let slug = (0..MAX_SLUG_ATTEMPTS)
            .map(|_| generate_slug())
            .find(|candidate| !tables.documents.values().any(|d| &d.link_slug == candidate))
            .ok_or(DatabaseError::SlugExhausted(MAX_SLUG_ATTEMPTS))?;

        tables.last_document_id += 1;
        let now = Utc::now();
        let document = Document {
            id: tables.last_document_id,
            user_id: new.user_id,
            title: new.title,
            content_json: new.content_json,
            thumbnail_path: new.thumbnail_path,
            keywords: new.keywords,
            link_slug: slug,
            followers_only: new.followers_only,
            visibility: new.visibility.as_str().to_string(),
            document_status: DocumentStatus::Active.as_str().to_string(),
            created_at: now,
            updated_at: now,
        };
        tables.documents.insert(document.id, document.clone());

        info!(doc_id = document.id, user_id = document.user_id, "Document created");
        Ok(document)
    }

    async fn delete_document(&self, doc_id: DbId, owner_id: DbId) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;

        match tables.documents.get_mut(&doc_id) {
            Some(doc) if doc.user_id == owner_id && doc.status().is_active() => {
                doc.document_status = DocumentStatus::Deleted.as_str().to_string();
                doc.updated_at = Utc::now();
                Ok(())
            }
            _ => Err(DatabaseError::NotFound("Document not found".to_string())),
        }
    }

    async fn update_document(&self, update: DocumentUpdate) -> Result<UpdateStatus, DatabaseError> {
        let mut tables = self.tables.write().await;

        let outcome = check_update(tables.state_of(update.doc_id).as_ref(), update.editor_id);
        if outcome != UpdateStatus::Success {
            debug!(doc_id = update.doc_id, outcome = outcome.as_str(), "Update rejected");
            return Ok(outcome);
        }

        if let Some(doc) = tables.documents.get_mut(&update.doc_id) {
            doc.content_json = update.content_json.clone();
            if let Some(title) = update.title {
                doc.title = title;
            }
            if let Some(thumbnail_path) = update.thumbnail_path {
                doc.thumbnail_path = thumbnail_path;
            }
            if let Some(keywords) = update.keywords {
                doc.keywords = keywords;
            }
            if let Some(followers_only) = update.followers_only {
                doc.followers_only = followers_only;
            }
            if let Some(visibility) = update.visibility {
                doc.visibility = visibility.as_str().to_string();
            }
            doc.updated_at = Utc::now();
        }
        tables.append_version(update.doc_id, update.editor_id, &update.content_json);

        Ok(outcome)
    }

    async fn restore_version(&self, editor_id: DbId, version_id: DbId) -> Result<RestoreStatus, DatabaseError> {
        let mut tables = self.tables.write().await;

        let Some(version) = tables.versions.iter().find(|v| v.id == version_id).cloned() else {
            return Ok(check_restore(false, None, editor_id));
        };

        let outcome = check_restore(true, tables.state_of(version.document_id).as_ref(), editor_id);
        if outcome != RestoreStatus::Success {
            debug!(version_id, outcome = outcome.as_str(), "Restore rejected");
            return Ok(outcome);
        }

        if let Some(doc) = tables.documents.get_mut(&version.document_id) {
            doc.content_json = version.content_json.clone();
            doc.updated_at = Utc::now();
        }
        tables.append_version(version.document_id, editor_id, &version.content_json);

        Ok(outcome)
    }

    async fn document_by_slug(&self, slug: &str) -> Result<PublicDocument, DatabaseError> {
        let tables = self.tables.read().await;

        // Documents whose owner row is missing are invisible, as with the SQL join
        tables
            .documents
            .values()
            .filter(|doc| doc.link_slug == slug && doc.status().is_active())
            .find_map(|doc| {
                tables.users.get(&doc.user_id).map(|user| PublicDocument {
                    id: doc.id,
                    title: doc.title.clone(),
                    content_json: doc.content_json.clone(),
                    thumbnail_path: doc.thumbnail_path.clone(),
                    keywords: doc.keywords.clone(),
                    link_slug: doc.link_slug.clone(),
                    followers_only: doc.followers_only,
                    visibility: doc.visibility.clone(),
                    created_at: doc.created_at,
                    updated_at: doc.updated_at,
                    profile: OwnerProfile {
                        username: user.username.clone(),
                        display_name: user.display_name.clone(),
                        profile_picture: user.profile_picture.clone(),
                    },
                })
            })
            .ok_or_else(|| DatabaseError::NotFound("Document not found".to_string()))
    }

    async fn documents_by_owner(&self, owner_id: DbId) -> Result<Vec<DocumentSummary>, DatabaseError> {
        let tables = self.tables.read().await;

        let mut documents: Vec<&Document> = tables
            .documents
            .values()
            .filter(|doc| doc.user_id == owner_id && doc.status().is_active())
            .collect();
        documents.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(documents.into_iter().map(DocumentSummary::from).collect())
    }

    async fn document_versions(&self, doc_id: DbId, owner_id: DbId) -> Result<Vec<VersionSummary>, DatabaseError> {
        let tables = self.tables.read().await;

        let owned = tables
            .documents
            .get(&doc_id)
            .is_some_and(|doc| doc.user_id == owner_id);
        if !owned {
            return Ok(Vec::new());
        }

        let mut versions: Vec<VersionSummary> = tables
            .versions
            .iter()
            .filter(|v| v.document_id == doc_id)
            .map(VersionSummary::from)
            .collect();
        versions.sort_by_key(|v| v.version_number);

        Ok(versions)
    }

    async fn create_user(&self, user: NewUser) -> Result<bool, DatabaseError> {
        let mut tables = self.tables.write().await;

        if tables.users.contains_key(&user.user_id) {
            return Ok(false);
        }
        tables.users.insert(
            user.user_id,
            UserProfile {
                user_id: user.user_id,
                username: user.username,
                display_name: user.display_name,
                profile_picture: None,
                email: user.email,
            },
        );
        Ok(true)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Visibility;

    async fn store_with_owner(owner: DbId) -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_user(NewUser {
                user_id: owner,
                username: format!("user{}", owner),
                display_name: format!("user{}", owner),
                email: format!("user{}@example.com", owner),
            })
            .await
            .unwrap();
        store
    }

    fn new_doc(owner: DbId, content: &str) -> NewDocument {
        NewDocument {
            user_id: owner,
            title: "Notes".to_string(),
            content_json: content.to_string(),
            thumbnail_path: String::new(),
            keywords: String::new(),
            followers_only: false,
            visibility: Visibility::Public,
        }
    }

    fn edit(doc_id: DbId, editor_id: DbId, content: &str) -> DocumentUpdate {
        DocumentUpdate {
            doc_id,
            editor_id,
            content_json: content.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_requires_known_owner() {
        let store = MemoryStore::new();
        let err = store.create_document(new_doc(1, "{}")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Constraint(_)));
    }

    #[tokio::test]
    async fn updates_append_dense_versions() {
        let store = store_with_owner(1).await;
        let doc = store.create_document(new_doc(1, r#"{"v":0}"#)).await.unwrap();
        assert!(store.document_versions(doc.id, 1).await.unwrap().is_empty());

        for i in 1..=3 {
            let outcome = store.update_document(edit(doc.id, 1, &format!(r#"{{"v":{}}}"#, i))).await.unwrap();
            assert_eq!(outcome, UpdateStatus::Success);
        }

        let numbers: Vec<i32> = store
            .document_versions(doc.id, 1)
            .await
            .unwrap()
            .iter()
            .map(|v| v.version_number)
            .collect();
        assert_eq!(numbers, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn restore_copies_content_and_appends_version() {
        let store = store_with_owner(1).await;
        let doc = store.create_document(new_doc(1, "a")).await.unwrap();
        store.update_document(edit(doc.id, 1, "b")).await.unwrap();
        store.update_document(edit(doc.id, 1, "c")).await.unwrap();

        let first = store.document_versions(doc.id, 1).await.unwrap()[0].id;
        assert_eq!(store.restore_version(1, first).await.unwrap(), RestoreStatus::Success);

        let fetched = store.document_by_slug(&doc.link_slug).await.unwrap();
        assert_eq!(fetched.content_json, "b");
        assert_eq!(store.document_versions(doc.id, 1).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn deleted_documents_are_hidden_and_frozen() {
        let store = store_with_owner(1).await;
        let doc = store.create_document(new_doc(1, "a")).await.unwrap();
        store.update_document(edit(doc.id, 1, "b")).await.unwrap();
        let version = store.document_versions(doc.id, 1).await.unwrap()[0].id;

        store.delete_document(doc.id, 1).await.unwrap();

        assert!(matches!(
            store.document_by_slug(&doc.link_slug).await,
            Err(DatabaseError::NotFound(_))
        ));
        assert!(store.documents_by_owner(1).await.unwrap().is_empty());
        assert_eq!(store.update_document(edit(doc.id, 1, "c")).await.unwrap(), UpdateStatus::Inactive);
        assert_eq!(store.restore_version(1, version).await.unwrap(), RestoreStatus::DocumentInactive);
        assert!(matches!(
            store.delete_document(doc.id, 1).await,
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn replayed_user_is_not_reinserted() {
        let store = store_with_owner(7).await;
        let again = store
            .create_user(NewUser {
                user_id: 7,
                username: "other".to_string(),
                display_name: "other".to_string(),
                email: "other@example.com".to_string(),
            })
            .await
            .unwrap();
        assert!(!again);
    }
}
