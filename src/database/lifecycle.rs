//! Guarded transitions for editing and restoring documents.
//!
//! Both store backends load the current document state, ask these functions
//! whether the transition is allowed, and only write when the answer is
//! `Success`. The checks run in a fixed order so a caller who does not own a
//! document learns nothing about its lifecycle state.

use serde::Serialize;

use crate::types::{DbId, DocumentStatus};

/// The parts of a document row the transition rules look at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentState {
    pub owner_id: DbId,
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateStatus {
    Success,
    NotFound,
    Unauthorized,
    Inactive,
}

impl UpdateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateStatus::Success => "success",
            UpdateStatus::NotFound => "not_found",
            UpdateStatus::Unauthorized => "unauthorized",
            UpdateStatus::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RestoreStatus {
    Success,
    /// The requested version id does not exist
    RestoreFailed,
    DocumentInactive,
    Unauthorized,
    /// The version exists but its document row is gone
    VersionNotFound,
}

impl RestoreStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestoreStatus::Success => "success",
            RestoreStatus::RestoreFailed => "restore_failed",
            RestoreStatus::DocumentInactive => "document_inactive",
            RestoreStatus::Unauthorized => "unauthorized",
            RestoreStatus::VersionNotFound => "version_not_found",
        }
    }
}

/// May `editor` replace the content of `document`?
pub fn check_update(document: Option<&DocumentState>, editor: DbId) -> UpdateStatus {
    let Some(document) = document else {
        return UpdateStatus::NotFound;
    };
    if document.owner_id != editor {
        return UpdateStatus::Unauthorized;
    }
    if !document.status.is_active() {
        return UpdateStatus::Inactive;
    }
    UpdateStatus::Success
}

/// May `editor` roll `document` back to one of its versions?
///
/// `version_found` is false when the version id matched nothing; `document`
/// is the parent row of the version when it was found.
pub fn check_restore(version_found: bool, document: Option<&DocumentState>, editor: DbId) -> RestoreStatus {
    if !version_found {
        return RestoreStatus::RestoreFailed;
    }
    let Some(document) = document else {
        return RestoreStatus::VersionNotFound;
    };
    if document.owner_id != editor {
        return RestoreStatus::Unauthorized;
    }
    if !document.status.is_active() {
        return RestoreStatus::DocumentInactive;
    }
    RestoreStatus::Success
}

/// Version numbers start at 1 and never skip
pub fn next_version_number(current_max: Option<i32>) -> i32 {
    current_max.unwrap_or(0) + 1
}
