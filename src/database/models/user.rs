use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::DbId;

/// Profile row mirrored from the upstream identity system
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub user_id: DbId,
    pub username: String,
    pub display_name: String,
    pub profile_picture: Option<String>,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub user_id: DbId,
    pub username: String,
    pub display_name: String,
    pub email: String,
}
