//! Invite token repository for database operations.

use async_trait::async_trait;
use domain::models::{InviteToken, NewInviteToken};
use domain::services::{InviteTokenStore, StoreError};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{metadata_to_json, InviteTokenEntity, RoleDb};
use crate::metrics::QueryTimer;

const INVITE_TOKEN_COLUMNS: &str =
    "token, role, metadata, created_by, created_at, expires_at, used_at, used_by";

/// Repository for invite token database operations.
#[derive(Clone)]
pub struct InviteTokenRepository {
    pool: PgPool,
}

impl InviteTokenRepository {
    /// Creates a new InviteTokenRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new unused invite.
    pub async fn create(&self, invite: &NewInviteToken) -> Result<InviteTokenEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_invite_token");
        let result = sqlx::query_as::<_, InviteTokenEntity>(&format!(
            r#"
            INSERT INTO invite_tokens (token, role, metadata, created_by, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {INVITE_TOKEN_COLUMNS}
            "#
        ))
        .bind(&invite.token)
        .bind(RoleDb::from(invite.role))
        .bind(metadata_to_json(&invite.metadata))
        .bind(invite.created_by)
        .bind(invite.expires_at)
        .fetch_one(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Find invite by token.
    pub async fn find_by_token(&self, token: &str) -> Result<Option<InviteTokenEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_invite_token");
        let result = sqlx::query_as::<_, InviteTokenEntity>(&format!(
            r#"
            SELECT {INVITE_TOKEN_COLUMNS}
            FROM invite_tokens
            WHERE token = $1
            "#
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Mark the invite used if it is still unused and unexpired.
    ///
    /// Concurrent callers race on the row lock; only the first sees a row.
    pub async fn mark_used(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<Option<InviteTokenEntity>, sqlx::Error> {
        let timer = QueryTimer::new("mark_invite_token_used");
        let result = sqlx::query_as::<_, InviteTokenEntity>(&format!(
            r#"
            UPDATE invite_tokens
            SET used_at = NOW(), used_by = $2
            WHERE token = $1
              AND used_at IS NULL
              AND (expires_at IS NULL OR expires_at > NOW())
            RETURNING {INVITE_TOKEN_COLUMNS}
            "#
        ))
        .bind(token)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await;
        timer.finish(&result);
        result
    }

    /// Clear a redemption made by `user_id`.
    pub async fn release(&self, token: &str, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("release_invite_token");
        let result = sqlx::query(
            r#"
            UPDATE invite_tokens
            SET used_at = NULL, used_by = NULL
            WHERE token = $1 AND used_by = $2
            "#,
        )
        .bind(token)
        .bind(user_id)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.rows_affected() > 0)
    }
}

#[async_trait]
impl InviteTokenStore for InviteTokenRepository {
    async fn insert_invite(&self, invite: NewInviteToken) -> Result<InviteToken, StoreError> {
        Ok(self.create(&invite).await?.into())
    }

    async fn find_invite(&self, token: &str) -> Result<Option<InviteToken>, StoreError> {
        Ok(self.find_by_token(token).await?.map(Into::into))
    }

    async fn mark_invite_used(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<Option<InviteToken>, StoreError> {
        Ok(self.mark_used(token, user_id).await?.map(Into::into))
    }

    async fn release_invite(&self, token: &str, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.release(token, user_id).await?)
    }
}
