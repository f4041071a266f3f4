// handlers/protected/mod.rs - Protected handlers (bearer token required)
//
// Every handler here takes an `AuthUser`; the acting user always comes from
// the verified token, never from the request body.
pub mod documents;
pub mod versions;

pub use documents::{create_document, delete_document, documents_by_owner, update_document};
pub use versions::{document_versions, restore_version};
