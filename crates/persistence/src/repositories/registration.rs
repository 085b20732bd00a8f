//! Registration repository for database operations.

use async_trait::async_trait;
use domain::models::Registration;
use domain::services::{RegistrationStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::RegistrationWithAttendeeEntity;
use crate::metrics::QueryTimer;

/// Read-only access to registrations and their attendees.
#[derive(Clone)]
pub struct RegistrationRepository {
    pool: PgPool,
}

impl RegistrationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find registration by ID with its attendee.
    pub async fn find_with_attendee(
        &self,
        id: Uuid,
    ) -> Result<Option<RegistrationWithAttendeeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_registration_with_attendee");
        let result = sqlx::query_as::<_, RegistrationWithAttendeeEntity>(
            r#"
            SELECT
                r.id, r.event_id, r.created_at,
                a.id as attendee_id, a.name as attendee_name, a.user_id as attendee_user_id
            FROM registrations r
            JOIN attendees a ON r.attendee_id = a.id
            WHERE r.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }
}

#[async_trait]
impl RegistrationStore for RegistrationRepository {
    async fn find_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        Ok(self
            .find_with_attendee(registration_id)
            .await?
            .map(Into::into))
    }
}
