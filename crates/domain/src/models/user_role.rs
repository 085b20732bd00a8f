//! Roles granted to user accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::invite::InviteMetadata;
use super::role::Role;

/// A durable `(user_id, role)` grant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct UserRole {
    pub user_id: Uuid,
    pub role: Role,
    pub metadata: InviteMetadata,
    pub granted_at: DateTime<Utc>,
}

/// Where the signed-in user should be sent.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DestinationResponse {
    pub redirect_url: String,
}
