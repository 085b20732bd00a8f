//! Check-in repository for database operations.

use async_trait::async_trait;
use domain::models::{CheckIn, NewCheckIn};
use domain::services::{CheckInStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::CheckInEntity;
use crate::metrics::QueryTimer;

/// Repository for door check-ins.
#[derive(Clone)]
pub struct CheckInRepository {
    pool: PgPool,
}

impl CheckInRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a check-in unless the registration already has one in this scope.
    pub async fn create(&self, check_in: &NewCheckIn) -> Result<Option<CheckInEntity>, sqlx::Error> {
        let timer = QueryTimer::new("create_check_in");
        let result = sqlx::query_as::<_, CheckInEntity>(
            r#"
            INSERT INTO checkins (registration_id, event_id, attendee_id, scope_key, checked_in_by)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (registration_id, scope_key) DO NOTHING
            RETURNING id, registration_id, event_id, attendee_id, scope_key, checked_in_by, checked_in_at
            "#,
        )
        .bind(check_in.registration_id)
        .bind(check_in.event_id)
        .bind(check_in.attendee_id)
        .bind(&check_in.scope_key)
        .bind(check_in.checked_in_by)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    pub async fn delete(&self, registration_id: Uuid, scope_key: &str) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_check_in");
        let result = sqlx::query(
            r#"
            DELETE FROM checkins
            WHERE registration_id = $1 AND scope_key = $2
            "#,
        )
        .bind(registration_id)
        .bind(scope_key)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.rows_affected() > 0)
    }
}

#[async_trait]
impl CheckInStore for CheckInRepository {
    async fn record_check_in(&self, check_in: NewCheckIn) -> Result<Option<CheckIn>, StoreError> {
        Ok(self.create(&check_in).await?.map(Into::into))
    }

    async fn remove_check_in(
        &self,
        registration_id: Uuid,
        scope_key: &str,
    ) -> Result<bool, StoreError> {
        Ok(self.delete(registration_id, scope_key).await?)
    }
}
