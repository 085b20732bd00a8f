//! User role repository for database operations.

use async_trait::async_trait;
use domain::models::{InviteMetadata, Role, UserRole};
use domain::services::{StoreError, UserRoleStore};
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{metadata_to_json, RoleDb, UserRoleEntity};
use crate::metrics::QueryTimer;

/// Repository for role grants.
#[derive(Clone)]
pub struct UserRoleRepository {
    pool: PgPool,
}

impl UserRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grant a role. Returns false if the user already held it.
    pub async fn grant(
        &self,
        user_id: Uuid,
        role: RoleDb,
        metadata: serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("grant_user_role");
        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role, metadata)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, role) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role)
        .bind(metadata)
        .execute(&self.pool)
        .await;
        timer.finish(&result);
        Ok(result?.rows_affected() > 0)
    }

    /// List a user's roles, oldest grant first.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Vec<UserRoleEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_user_roles");
        let result = sqlx::query_as::<_, UserRoleEntity>(
            r#"
            SELECT user_id, role, metadata, granted_at
            FROM user_roles
            WHERE user_id = $1
            ORDER BY granted_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await;
        timer.finish(&result);
        result
    }
}

#[async_trait]
impl UserRoleStore for UserRoleRepository {
    async fn upsert_role(
        &self,
        user_id: Uuid,
        role: Role,
        metadata: &InviteMetadata,
    ) -> Result<bool, StoreError> {
        Ok(self
            .grant(user_id, role.into(), metadata_to_json(metadata))
            .await?)
    }

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<UserRole>, StoreError> {
        Ok(self
            .find_by_user(user_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
