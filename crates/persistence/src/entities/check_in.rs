//! Check-in entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row mapping for the checkins table.
#[derive(Debug, Clone, FromRow)]
pub struct CheckInEntity {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub attendee_id: Uuid,
    pub scope_key: String,
    pub checked_in_by: Uuid,
    pub checked_in_at: DateTime<Utc>,
}

impl From<CheckInEntity> for domain::models::CheckIn {
    fn from(entity: CheckInEntity) -> Self {
        Self {
            id: entity.id,
            registration_id: entity.registration_id,
            event_id: entity.event_id,
            attendee_id: entity.attendee_id,
            scope_key: entity.scope_key,
            checked_in_by: entity.checked_in_by,
            checked_in_at: entity.checked_in_at,
        }
    }
}
