use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{debug, info, warn};

use crate::database::lifecycle::{
    check_restore, check_update, next_version_number, DocumentState, RestoreStatus, UpdateStatus,
};
use crate::database::models::{
    Document, DocumentSummary, DocumentUpdate, NewDocument, NewUser, PublicDocument, VersionSummary,
};
use crate::database::slug::{generate_slug, MAX_SLUG_ATTEMPTS};
use crate::database::store::DocumentStore;
use crate::database::{DatabaseError, DatabaseManager};
use crate::types::{DbId, DocumentStatus};

/// Name of the unique constraint on `"UserDocument".link_slug`
const LINK_SLUG_CONSTRAINT: &str = "user_document_link_slug_key";

/// Postgres-backed document store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lock the document row for the rest of the transaction
    async fn lock_document(
        tx: &mut Transaction<'_, Postgres>,
        doc_id: DbId,
    ) -> Result<Option<DocumentState>, DatabaseError> {
        let row: Option<(DbId, String)> = sqlx::query_as(
            r#"SELECT user_id, document_status FROM "UserDocument" WHERE id = $1 FOR UPDATE"#,
        )
        .bind(doc_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(|(owner_id, status)| DocumentState {
            owner_id,
            status: DocumentStatus::from(status.as_str()),
        }))
    }

    /// Snapshot `content_json` as the next version of `doc_id`.
    ///
    /// Must run while the document row is locked so concurrent editors
    /// cannot compute the same version number.
    async fn append_version(
        tx: &mut Transaction<'_, Postgres>,
        doc_id: DbId,
        editor_id: DbId,
        content_json: &str,
    ) -> Result<i32, DatabaseError> {
        let (current_max,): (Option<i32>,) =
            sqlx::query_as(r#"SELECT MAX(version_number) FROM "DocumentVersion" WHERE document_id = $1"#)
                .bind(doc_id)
                .fetch_one(&mut **tx)
                .await?;

        let version_number = next_version_number(current_max);
        sqlx::query(
            r#"INSERT INTO "DocumentVersion" (document_id, edited_by_user_id, version_number, content_json)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(doc_id)
        .bind(editor_id)
        .bind(version_number)
        .bind(content_json)
        .execute(&mut **tx)
        .await?;

        Ok(version_number)
    }
}

fn is_slug_collision(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(LINK_SLUG_CONSTRAINT)
        }
        _ => false,
    }
}

fn constraint_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err)
            if db_err.is_foreign_key_violation() || db_err.is_check_violation() || db_err.is_unique_violation() =>
        {
            Some(db_err.message().to_string())
        }
        _ => None,
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn create_document(&self, new: NewDocument) -> Result<Document, DatabaseError> {
        for attempt in 1..=MAX_SLUG_ATTEMPTS {
            let slug = generate_slug();
            let result = sqlx::query_as::<_, Document>(
                r#"INSERT INTO "UserDocument"
                       (user_id, title, content_json, thumbnail_path, keywords, link_slug,
                        followers_only, visibility, document_status)
                   VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'active')
                   RETURNING *"#,
            )
            .bind(new.user_id)
            .bind(&new.title)
            .bind(&new.content_json)
            .bind(&new.thumbnail_path)
            .bind(&new.keywords)
            .bind(&slug)
            .bind(new.followers_only)
            .bind(new.visibility.as_str())
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(document) => {
                    info!(doc_id = document.id, user_id = new.user_id, slug = %document.link_slug, "Document created");
                    return Ok(document);
                }
                Err(err) if is_slug_collision(&err) => {
                    warn!(attempt, "Link slug collision, retrying");
                }
                Err(err) => {
                    return Err(match constraint_violation(&err) {
                        Some(message) => DatabaseError::Constraint(message),
                        None => DatabaseError::Sqlx(err),
                    });
                }
            }
        }

        Err(DatabaseError::SlugExhausted(MAX_SLUG_ATTEMPTS))
    }

    async fn delete_document(&self, doc_id: DbId, owner_id: DbId) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"UPDATE "UserDocument"
               SET document_status = 'deleted', updated_at = NOW()
               WHERE id = $1 AND user_id = $2 AND document_status = 'active'"#,
        )
        .bind(doc_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Document not found".to_string()));
        }
        Ok(())
    }

    async fn update_document(&self, update: DocumentUpdate) -> Result<UpdateStatus, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let state = Self::lock_document(&mut tx, update.doc_id).await?;
        let outcome = check_update(state.as_ref(), update.editor_id);
        if outcome != UpdateStatus::Success {
            debug!(doc_id = update.doc_id, outcome = outcome.as_str(), "Update rejected");
            return Ok(outcome);
        }

        sqlx::query(
            r#"UPDATE "UserDocument"
               SET content_json = $2,
                   title = COALESCE($3, title),
                   thumbnail_path = COALESCE($4, thumbnail_path),
                   keywords = COALESCE($5, keywords),
                   followers_only = COALESCE($6, followers_only),
                   visibility = COALESCE($7, visibility),
                   updated_at = NOW()
               WHERE id = $1"#,
        )
        .bind(update.doc_id)
        .bind(&update.content_json)
        .bind(update.title.as_deref())
        .bind(update.thumbnail_path.as_deref())
        .bind(update.keywords.as_deref())
        .bind(update.followers_only)
        .bind(update.visibility.map(|v| v.as_str()))
        .execute(&mut *tx)
        .await?;

        let version = Self::append_version(&mut tx, update.doc_id, update.editor_id, &update.content_json).await?;
        tx.commit().await?;

        info!(doc_id = update.doc_id, version, "Document updated");
        Ok(outcome)
    }

    async fn restore_version(&self, editor_id: DbId, version_id: DbId) -> Result<RestoreStatus, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let version: Option<(DbId, String)> =
            sqlx::query_as(r#"SELECT document_id, content_json FROM "DocumentVersion" WHERE id = $1"#)
                .bind(version_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((doc_id, content_json)) = version else {
            return Ok(check_restore(false, None, editor_id));
        };

        let state = Self::lock_document(&mut tx, doc_id).await?;
        let outcome = check_restore(true, state.as_ref(), editor_id);
        if outcome != RestoreStatus::Success {
            debug!(version_id, doc_id, outcome = outcome.as_str(), "Restore rejected");
            return Ok(outcome);
        }

        sqlx::query(r#"UPDATE "UserDocument" SET content_json = $2, updated_at = NOW() WHERE id = $1"#)
            .bind(doc_id)
            .bind(&content_json)
            .execute(&mut *tx)
            .await?;

        let version = Self::append_version(&mut tx, doc_id, editor_id, &content_json).await?;
        tx.commit().await?;

        info!(doc_id, restored_from = version_id, version, "Document restored");
        Ok(outcome)
    }

    async fn document_by_slug(&self, slug: &str) -> Result<PublicDocument, DatabaseError> {
        sqlx::query_as::<_, PublicDocument>(
            r#"SELECT d.id, d.title, d.content_json, d.thumbnail_path, d.keywords, d.link_slug,
                      d.followers_only, d.visibility, d.created_at, d.updated_at,
                      u.username, u.display_name, u.profile_picture
               FROM "UserDocument" d
               JOIN "UserRelatedData" u ON u.user_id = d.user_id
               WHERE d.link_slug = $1 AND d.document_status = 'active'"#,
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Document not found".to_string()))
    }

    async fn documents_by_owner(&self, owner_id: DbId) -> Result<Vec<DocumentSummary>, DatabaseError> {
        let documents = sqlx::query_as::<_, DocumentSummary>(
            r#"SELECT id, title, thumbnail_path, keywords, link_slug, followers_only, visibility,
                      created_at, updated_at
               FROM "UserDocument"
               WHERE user_id = $1 AND document_status = 'active'
               ORDER BY created_at DESC, id DESC"#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(documents)
    }

    async fn document_versions(&self, doc_id: DbId, owner_id: DbId) -> Result<Vec<VersionSummary>, DatabaseError> {
        let versions = sqlx::query_as::<_, VersionSummary>(
            r#"SELECT v.id, v.version_number, v.edited_by_user_id, v.created_at
               FROM "DocumentVersion" v
               JOIN "UserDocument" d ON d.id = v.document_id
               WHERE v.document_id = $1 AND d.user_id = $2
               ORDER BY v.version_number ASC"#,
        )
        .bind(doc_id)
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(versions)
    }

    async fn create_user(&self, user: NewUser) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"INSERT INTO "UserRelatedData" (user_id, username, display_name, profile_picture, email)
               VALUES ($1, $2, $3, NULL, $4)
               ON CONFLICT (user_id) DO NOTHING"#,
        )
        .bind(user.user_id)
        .bind(&user.username)
        .bind(&user.display_name)
        .bind(&user.email)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}
