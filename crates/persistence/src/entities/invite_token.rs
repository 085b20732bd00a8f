//! Invite token entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::metadata::metadata_from_json;
use super::role::RoleDb;

/// Database row mapping for the invite_tokens table.
#[derive(Debug, Clone, FromRow)]
pub struct InviteTokenEntity {
    pub token: String,
    pub role: RoleDb,
    pub metadata: serde_json::Value,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<Uuid>,
}

impl From<InviteTokenEntity> for domain::models::InviteToken {
    fn from(entity: InviteTokenEntity) -> Self {
        Self {
            token: entity.token,
            role: entity.role.into(),
            metadata: metadata_from_json(entity.metadata),
            created_by: entity.created_by,
            created_at: entity.created_at,
            expires_at: entity.expires_at,
            used_at: entity.used_at,
            used_by: entity.used_by,
        }
    }
}
