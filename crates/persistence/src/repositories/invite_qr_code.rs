//! Invite-QR code repository for database operations.

use async_trait::async_trait;
use domain::models::{InviteQrCode, NewInviteQrCode};
use domain::services::{InviteQrStore, StoreError};
use sqlx::PgPool;

use crate::entities::InviteQrCodeEntity;
use crate::metrics::QueryTimer;

/// Repository for invite-QR code database operations.
#[derive(Clone)]
pub struct InviteQrCodeRepository {
    pool: PgPool,
}

impl InviteQrCodeRepository {
    /// Creates a new InviteQrCodeRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new invite-QR code.
    pub async fn create(&self, code: &NewInviteQrCode) -> Result<InviteQrCodeEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invite_qr_code");
        let result = sqlx::query_as::<_, InviteQrCodeEntity>(
            r#"
            INSERT INTO invite_qr_codes (invite_code, event_id, created_by, max_uses, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, invite_code, event_id, created_by, max_uses, used_count, expires_at, created_at
            "#,
        )
        .bind(&code.invite_code)
        .bind(code.event_id)
        .bind(code.created_by)
        .bind(code.max_uses)
        .bind(code.expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Find invite-QR code by its code.
    pub async fn find_by_code(&self, code: &str) -> Result<Option<InviteQrCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invite_qr_code");
        let result = sqlx::query_as::<_, InviteQrCodeEntity>(
            r#"
            SELECT id, invite_code, event_id, created_by, max_uses, used_count, expires_at, created_at
            FROM invite_qr_codes
            WHERE invite_code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Count one use. The cap and expiry are checked in the same statement.
    pub async fn increment_usage(
        &self,
        code: &str,
    ) -> Result<Option<InviteQrCodeEntity>, sqlx::Error> {
        let timer = QueryTimer::new("increment_invite_qr_usage");
        let result = sqlx::query_as::<_, InviteQrCodeEntity>(
            r#"
            UPDATE invite_qr_codes
            SET used_count = used_count + 1
            WHERE invite_code = $1
              AND (max_uses IS NULL OR used_count < max_uses)
              AND (expires_at IS NULL OR expires_at > NOW())
            RETURNING id, invite_code, event_id, created_by, max_uses, used_count, expires_at, created_at
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }
}

#[async_trait]
impl InviteQrStore for InviteQrCodeRepository {
    async fn insert_invite_qr(&self, code: NewInviteQrCode) -> Result<InviteQrCode, StoreError> {
        Ok(self.create(&code).await?.into())
    }

    async fn find_invite_qr(&self, invite_code: &str) -> Result<Option<InviteQrCode>, StoreError> {
        Ok(self.find_by_code(invite_code).await?.map(Into::into))
    }

    async fn consume_invite_qr(
        &self,
        invite_code: &str,
    ) -> Result<Option<InviteQrCode>, StoreError> {
        Ok(self.increment_usage(invite_code).await?.map(Into::into))
    }
}
