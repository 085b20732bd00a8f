//! Storage ports for the access protocol.
//!
//! Every state transition is a single conditional statement in the backing
//! store. Implementations must apply each of the conditional methods below
//! atomically; callers never read-then-write.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    CheckIn, Event, InviteMetadata, InviteQrCode, InviteToken, NewCheckIn, NewInviteQrCode,
    NewInviteToken, Registration, Role, UserRole,
};

/// Storage failure surfaced to services.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
                StoreError::Conflict(db_err.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

/// Single-use invite tokens.
#[async_trait]
pub trait InviteTokenStore: Send + Sync {
    /// Insert an unused token. A duplicate token yields [`StoreError::Conflict`].
    async fn insert_invite(&self, invite: NewInviteToken) -> Result<InviteToken, StoreError>;

    async fn find_invite(&self, token: &str) -> Result<Option<InviteToken>, StoreError>;

    /// Set `used_at`/`used_by` only if the token is unused and unexpired.
    /// Returns `None` when no row matched.
    async fn mark_invite_used(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<Option<InviteToken>, StoreError>;

    /// Clear a redemption made by `user_id`. Returns false if it was not theirs.
    async fn release_invite(&self, token: &str, user_id: Uuid) -> Result<bool, StoreError>;
}

/// Event-scoped invite-QR codes.
#[async_trait]
pub trait InviteQrStore: Send + Sync {
    /// Insert a code. A duplicate code yields [`StoreError::Conflict`].
    async fn insert_invite_qr(&self, code: NewInviteQrCode) -> Result<InviteQrCode, StoreError>;

    async fn find_invite_qr(&self, invite_code: &str) -> Result<Option<InviteQrCode>, StoreError>;

    /// Increment `used_count` only if the code is unexpired and under its cap.
    /// Returns `None` when no row matched.
    async fn consume_invite_qr(
        &self,
        invite_code: &str,
    ) -> Result<Option<InviteQrCode>, StoreError>;
}

/// Read access to events.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>, StoreError>;
}

/// Read access to registrations and their attendees.
#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn find_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Registration>, StoreError>;
}

/// Durable role grants keyed on `(user_id, role)`.
#[async_trait]
pub trait UserRoleStore: Send + Sync {
    /// Insert the grant if absent. Returns true when a new row was written.
    async fn upsert_role(
        &self,
        user_id: Uuid,
        role: Role,
        metadata: &InviteMetadata,
    ) -> Result<bool, StoreError>;

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<UserRole>, StoreError>;
}

/// Check-in records, unique on `(registration_id, scope_key)`.
#[async_trait]
pub trait CheckInStore: Send + Sync {
    /// Record the check-in unless one already exists in the same scope.
    /// Returns `None` for a duplicate.
    async fn record_check_in(&self, check_in: NewCheckIn) -> Result<Option<CheckIn>, StoreError>;

    /// Delete the check-in in the given scope. Returns false if there was none.
    async fn remove_check_in(
        &self,
        registration_id: Uuid,
        scope_key: &str,
    ) -> Result<bool, StoreError>;
}
