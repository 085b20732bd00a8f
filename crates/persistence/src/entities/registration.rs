//! Registration entity (database row mapping).

use chrono::{DateTime, Utc};
use domain::models::{Attendee, Registration};
use sqlx::FromRow;
use uuid::Uuid;

/// Registration joined with its attendee.
#[derive(Debug, Clone, FromRow)]
pub struct RegistrationWithAttendeeEntity {
    pub id: Uuid,
    pub event_id: Uuid,
    pub created_at: DateTime<Utc>,
    // Attendee info
    pub attendee_id: Uuid,
    pub attendee_name: String,
    pub attendee_user_id: Option<Uuid>,
}

impl From<RegistrationWithAttendeeEntity> for Registration {
    fn from(entity: RegistrationWithAttendeeEntity) -> Self {
        Self {
            id: entity.id,
            event_id: entity.event_id,
            attendee: Attendee {
                id: entity.attendee_id,
                name: entity.attendee_name,
                user_id: entity.attendee_user_id,
            },
            created_at: entity.created_at,
        }
    }
}
