//! User role entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::metadata::metadata_from_json;
use super::role::RoleDb;

/// Database row mapping for the user_roles table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRoleEntity {
    pub user_id: Uuid,
    pub role: RoleDb,
    pub metadata: serde_json::Value,
    pub granted_at: DateTime<Utc>,
}

impl From<UserRoleEntity> for domain::models::UserRole {
    fn from(entity: UserRoleEntity) -> Self {
        Self {
            user_id: entity.user_id,
            role: entity.role.into(),
            metadata: metadata_from_json(entity.metadata),
            granted_at: entity.granted_at,
        }
    }
}
