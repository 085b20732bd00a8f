//! Invite-QR code entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the invite_qr_codes table.
#[derive(Debug, Clone, FromRow)]
pub struct InviteQrCodeEntity {
    pub id: Uuid,
    pub invite_code: String,
    pub event_id: Uuid,
    pub created_by: Uuid,
    pub max_uses: Option<i32>,
    pub used_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<InviteQrCodeEntity> for domain::models::InviteQrCode {
    fn from(entity: InviteQrCodeEntity) -> Self {
        Self {
            id: entity.id,
            invite_code: entity.invite_code,
            event_id: entity.event_id,
            created_by: entity.created_by,
            max_uses: entity.max_uses,
            used_count: entity.used_count,
            expires_at: entity.expires_at,
            created_at: entity.created_at,
        }
    }
}
