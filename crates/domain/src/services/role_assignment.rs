//! Role grants and post-login landing paths.

use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use super::store::{StoreError, UserRoleStore};
use crate::models::{InviteMetadata, Role, UserRole, DEFAULT_LANDING_PATH};

#[derive(Debug, Error)]
pub enum RoleAssignmentError {
    #[error("Failed to assign role: {0}")]
    AssignmentFailed(#[from] StoreError),
}

/// Grants roles and resolves where a user lands after signing in.
#[derive(Clone)]
pub struct RoleAssignmentService {
    roles: Arc<dyn UserRoleStore>,
}

impl RoleAssignmentService {
    pub fn new(roles: Arc<dyn UserRoleStore>) -> Self {
        Self { roles }
    }

    /// Grant `role` to `user_id` and return the path for that role.
    ///
    /// Granting a role the user already holds is a no-op and still succeeds.
    #[instrument(skip(self, metadata), fields(role = %role))]
    pub async fn assign(
        &self,
        user_id: Uuid,
        role: Role,
        metadata: &InviteMetadata,
    ) -> Result<&'static str, RoleAssignmentError> {
        let inserted = self.roles.upsert_role(user_id, role, metadata).await?;
        if inserted {
            info!(user_id = %user_id, "Role granted");
        }
        Ok(role.destination_path())
    }

    pub async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<UserRole>, RoleAssignmentError> {
        Ok(self.roles.roles_for_user(user_id).await?)
    }

    /// Landing path for the user's highest-priority role, or the default.
    pub async fn landing_for_user(&self, user_id: Uuid) -> Result<&'static str, RoleAssignmentError> {
        let roles = self.roles.roles_for_user(user_id).await?;
        Ok(roles
            .iter()
            .map(|grant| grant.role)
            .min_by_key(Role::priority)
            .map(|role| role.destination_path())
            .unwrap_or(DEFAULT_LANDING_PATH))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryStore;

    fn service(store: &Arc<InMemoryStore>) -> RoleAssignmentService {
        RoleAssignmentService::new(store.clone())
    }

    #[tokio::test]
    async fn test_assign_returns_destination() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let user = Uuid::new_v4();

        let path = service
            .assign(user, Role::Promoter, &InviteMetadata::new())
            .await
            .unwrap();
        assert_eq!(path, "/app/promoter");

        let path = service
            .assign(user, Role::DoorStaff, &InviteMetadata::new())
            .await
            .unwrap();
        assert_eq!(path, "/door");
    }

    #[tokio::test]
    async fn test_assign_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let user = Uuid::new_v4();

        for _ in 0..3 {
            service
                .assign(user, Role::EventOrganizer, &InviteMetadata::new())
                .await
                .unwrap();
        }
        let roles = service.roles_for_user(user).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role, Role::EventOrganizer);
    }

    #[tokio::test]
    async fn test_landing_prefers_highest_priority_role() {
        let store = Arc::new(InMemoryStore::new());
        let service = service(&store);
        let user = Uuid::new_v4();

        assert_eq!(service.landing_for_user(user).await.unwrap(), "/me");

        service
            .assign(user, Role::DoorStaff, &InviteMetadata::new())
            .await
            .unwrap();
        assert_eq!(service.landing_for_user(user).await.unwrap(), "/door");

        service
            .assign(user, Role::VenueAdmin, &InviteMetadata::new())
            .await
            .unwrap();
        assert_eq!(service.landing_for_user(user).await.unwrap(), "/app/venue");
    }

    #[tokio::test]
    async fn test_store_failure_surfaces() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_role_writes(true);
        let result = service(&store)
            .assign(Uuid::new_v4(), Role::Promoter, &InviteMetadata::new())
            .await;
        assert!(matches!(result, Err(RoleAssignmentError::AssignmentFailed(_))));
    }
}
