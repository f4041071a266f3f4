pub mod document;
pub mod user;
pub mod version;

pub use document::{Document, DocumentSummary, DocumentUpdate, NewDocument, OwnerProfile, PublicDocument};
pub use user::{NewUser, UserProfile};
pub use version::{DocumentVersion, VersionSummary};
