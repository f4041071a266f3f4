use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::models::NewUser;
use crate::database::{DatabaseError, DocumentStore};
use crate::types::DbId;

pub const USER_REGISTERED: &str = "user.registered";
pub const USER_LOGIN: &str = "user.login";

/// Envelope posted by the upstream identity system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEvent {
    pub event_type: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub user_id: Option<DbId>,
    #[serde(default)]
    pub data: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationData {
    #[serde(default)]
    pub user_id: Option<DbId>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub registration_timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginData {
    #[serde(default)]
    pub user_id: Option<DbId>,
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub login_timestamp: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("Invalid {event_type} payload: {reason}")]
    InvalidPayload { event_type: &'static str, reason: String },
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    UserCreated,
    /// Registration replayed for a user that already exists
    UserExists,
    LoginRecorded,
    Ignored,
}

/// Applies upstream user-lifecycle events to the local profile table
pub struct UserEventService {
    store: Arc<dyn DocumentStore>,
}

impl UserEventService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn process(&self, event: UserEvent) -> Result<EventOutcome, EventError> {
        info!(
            event_type = %event.event_type,
            source = event.source.as_deref().unwrap_or("unknown"),
            user_id = ?event.user_id,
            "Received user event"
        );

        match event.event_type.as_str() {
            USER_REGISTERED => self.handle_registration(&event).await,
            USER_LOGIN => Self::handle_login(&event),
            other => {
                warn!(event_type = other, "Ignoring unknown event type");
                Ok(EventOutcome::Ignored)
            }
        }
    }

    async fn handle_registration(&self, event: &UserEvent) -> Result<EventOutcome, EventError> {
        let data: RegistrationData = parse_data(USER_REGISTERED, &event.data)?;
        let user_id = resolve_user_id(USER_REGISTERED, data.user_id, event.user_id)?;

        let inserted = self
            .store
            .create_user(NewUser {
                user_id,
                username: data.username.clone(),
                // Profiles start with the username as display name
                display_name: data.username.clone(),
                email: data.email,
            })
            .await?;

        if inserted {
            info!(
                user_id,
                username = %data.username,
                registered_at = data.registration_timestamp.as_deref().unwrap_or(""),
                "User profile created"
            );
            Ok(EventOutcome::UserCreated)
        } else {
            info!(user_id, "User profile already exists, registration replay ignored");
            Ok(EventOutcome::UserExists)
        }
    }

    fn handle_login(event: &UserEvent) -> Result<EventOutcome, EventError> {
        let data: LoginData = parse_data(USER_LOGIN, &event.data)?;
        let user_id = resolve_user_id(USER_LOGIN, data.user_id, event.user_id)?;

        info!(
            user_id,
            username = %data.username,
            ip_address = data.ip_address.as_deref().unwrap_or(""),
            logged_in_at = data.login_timestamp.as_deref().unwrap_or(""),
            "User logged in"
        );
        Ok(EventOutcome::LoginRecorded)
    }
}

fn parse_data<T: serde::de::DeserializeOwned>(event_type: &'static str, data: &Value) -> Result<T, EventError> {
    T::deserialize(data).map_err(|e| EventError::InvalidPayload {
        event_type,
        reason: e.to_string(),
    })
}

/// The nested payload wins; the envelope id is a fallback
fn resolve_user_id(
    event_type: &'static str,
    from_data: Option<DbId>,
    from_envelope: Option<DbId>,
) -> Result<DbId, EventError> {
    match from_data.or(from_envelope) {
        Some(id) if id > 0 => Ok(id),
        _ => Err(EventError::InvalidPayload {
            event_type,
            reason: "user_id must be a positive integer".to_string(),
        }),
    }
}
