// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Slug reads, upstream event intake and the health probe.
pub mod documents;
pub mod events;
pub mod health;

pub use documents::document_by_slug;
pub use events::receive_event;
pub use health::health;
