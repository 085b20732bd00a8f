//! In-process implementation of the storage ports.
//!
//! Each conditional method takes the lock once and never awaits while
//! holding it, which gives the same all-or-nothing behaviour as a single
//! conditional statement in PostgreSQL. Used by tests and local tooling.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
#[cfg(any(test, feature = "test-util"))]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::store::{
    CheckInStore, EventStore, InviteQrStore, InviteTokenStore, RegistrationStore, StoreError,
    UserRoleStore,
};
use crate::models::{
    Attendee, CheckIn, Event, InviteMetadata, InviteQrCode, InviteToken, NewCheckIn,
    NewInviteQrCode, NewInviteToken, Registration, Role, UserRole,
};

#[derive(Default)]
struct Tables {
    invites: HashMap<String, InviteToken>,
    invite_qr_codes: HashMap<String, InviteQrCode>,
    events: HashMap<Uuid, Event>,
    registrations: HashMap<Uuid, Registration>,
    user_roles: HashMap<(Uuid, Role), UserRole>,
    check_ins: HashMap<(Uuid, String), CheckIn>,
}

#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    #[cfg(any(test, feature = "test-util"))]
    fail_role_writes: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    // Seeding helpers recover from poisoning; they only run in setup code.
    fn lock_for_setup(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed an event owned by `owner`.
    pub fn add_event(&self, name: &str, owner: Uuid) -> Event {
        let event = Event {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            starts_at: None,
            created_by: owner,
        };
        self.lock_for_setup()
            .events
            .insert(event.id, event.clone());
        event
    }

    /// Seed a registration with a new attendee.
    pub fn add_registration(
        &self,
        event_id: Uuid,
        attendee_name: &str,
        user_id: Option<Uuid>,
    ) -> Registration {
        let registration = Registration {
            id: Uuid::new_v4(),
            event_id,
            attendee: Attendee {
                id: Uuid::new_v4(),
                name: attendee_name.to_string(),
                user_id,
            },
            created_at: Utc::now(),
        };
        self.lock_for_setup()
            .registrations
            .insert(registration.id, registration.clone());
        registration
    }

    pub fn invite(&self, token: &str) -> Option<InviteToken> {
        self.lock_for_setup().invites.get(token).cloned()
    }

    pub fn invite_qr(&self, invite_code: &str) -> Option<InviteQrCode> {
        self.lock_for_setup()
            .invite_qr_codes
            .get(invite_code)
            .cloned()
    }

    pub fn check_in_count(&self, registration_id: Uuid) -> usize {
        self.lock_for_setup()
            .check_ins
            .keys()
            .filter(|(id, _)| *id == registration_id)
            .count()
    }

    /// Make role writes fail, to exercise grant-failure handling.
    #[cfg(any(test, feature = "test-util"))]
    pub fn fail_role_writes(&self, fail: bool) {
        self.fail_role_writes.store(fail, Ordering::SeqCst);
    }
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[async_trait]
impl InviteTokenStore for InMemoryStore {
    async fn insert_invite(&self, invite: NewInviteToken) -> Result<InviteToken, StoreError> {
        let mut tables = self.lock()?;
        if tables.invites.contains_key(&invite.token) {
            return Err(StoreError::Conflict("invite token already exists".to_string()));
        }

        let stored = InviteToken {
            token: invite.token,
            role: invite.role,
            metadata: invite.metadata,
            created_by: invite.created_by,
            created_at: Utc::now(),
            expires_at: invite.expires_at,
            used_at: None,
            used_by: None,
        };
        tables.invites.insert(stored.token.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_invite(&self, token: &str) -> Result<Option<InviteToken>, StoreError> {
        Ok(self.lock()?.invites.get(token).cloned())
    }

    async fn mark_invite_used(
        &self,
        token: &str,
        user_id: Uuid,
    ) -> Result<Option<InviteToken>, StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        match tables.invites.get_mut(token) {
            Some(invite) if !invite.is_used() && !invite.is_expired_at(now) => {
                invite.used_at = Some(now);
                invite.used_by = Some(user_id);
                Ok(Some(invite.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn release_invite(&self, token: &str, user_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        match tables.invites.get_mut(token) {
            Some(invite) if invite.used_by == Some(user_id) => {
                invite.used_at = None;
                invite.used_by = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl InviteQrStore for InMemoryStore {
    async fn insert_invite_qr(&self, code: NewInviteQrCode) -> Result<InviteQrCode, StoreError> {
        let mut tables = self.lock()?;
        if tables.invite_qr_codes.contains_key(&code.invite_code) {
            return Err(StoreError::Conflict("invite code already exists".to_string()));
        }

        let stored = InviteQrCode {
            id: Uuid::new_v4(),
            invite_code: code.invite_code,
            event_id: code.event_id,
            created_by: code.created_by,
            max_uses: code.max_uses,
            used_count: 0,
            expires_at: code.expires_at,
            created_at: Utc::now(),
        };
        tables
            .invite_qr_codes
            .insert(stored.invite_code.clone(), stored.clone());
        Ok(stored)
    }

    async fn find_invite_qr(&self, invite_code: &str) -> Result<Option<InviteQrCode>, StoreError> {
        Ok(self.lock()?.invite_qr_codes.get(invite_code).cloned())
    }

    async fn consume_invite_qr(
        &self,
        invite_code: &str,
    ) -> Result<Option<InviteQrCode>, StoreError> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        match tables.invite_qr_codes.get_mut(invite_code) {
            Some(code) if !code.is_expired_at(now) && !code.is_exhausted() => {
                code.used_count += 1;
                Ok(Some(code.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl EventStore for InMemoryStore {
    async fn find_event(&self, event_id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.lock()?.events.get(&event_id).cloned())
    }
}

#[async_trait]
impl RegistrationStore for InMemoryStore {
    async fn find_registration(
        &self,
        registration_id: Uuid,
    ) -> Result<Option<Registration>, StoreError> {
        Ok(self.lock()?.registrations.get(&registration_id).cloned())
    }
}

#[async_trait]
impl UserRoleStore for InMemoryStore {
    async fn upsert_role(
        &self,
        user_id: Uuid,
        role: Role,
        metadata: &InviteMetadata,
    ) -> Result<bool, StoreError> {
        #[cfg(any(test, feature = "test-util"))]
        if self.fail_role_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("role writes disabled".to_string()));
        }

        let mut tables = self.lock()?;
        if tables.user_roles.contains_key(&(user_id, role)) {
            return Ok(false);
        }
        tables.user_roles.insert(
            (user_id, role),
            UserRole {
                user_id,
                role,
                metadata: metadata.clone(),
                granted_at: Utc::now(),
            },
        );
        Ok(true)
    }

    async fn roles_for_user(&self, user_id: Uuid) -> Result<Vec<UserRole>, StoreError> {
        let tables = self.lock()?;
        let mut roles: Vec<UserRole> = tables
            .user_roles
            .values()
            .filter(|grant| grant.user_id == user_id)
            .cloned()
            .collect();
        roles.sort_by_key(|grant| grant.granted_at);
        Ok(roles)
    }
}

#[async_trait]
impl CheckInStore for InMemoryStore {
    async fn record_check_in(&self, check_in: NewCheckIn) -> Result<Option<CheckIn>, StoreError> {
        let mut tables = self.lock()?;
        let key = (check_in.registration_id, check_in.scope_key.clone());
        if tables.check_ins.contains_key(&key) {
            return Ok(None);
        }

        let stored = CheckIn {
            id: Uuid::new_v4(),
            registration_id: check_in.registration_id,
            event_id: check_in.event_id,
            attendee_id: check_in.attendee_id,
            scope_key: check_in.scope_key,
            checked_in_by: check_in.checked_in_by,
            checked_in_at: Utc::now(),
        };
        tables.check_ins.insert(key, stored.clone());
        Ok(Some(stored))
    }

    async fn remove_check_in(
        &self,
        registration_id: Uuid,
        scope_key: &str,
    ) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        Ok(tables
            .check_ins
            .remove(&(registration_id, scope_key.to_string()))
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CheckInPolicy;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Launch Night 2026!"), "launch-night-2026");
        assert_eq!(slugify("  rooftop  "), "rooftop");
    }

    #[tokio::test]
    async fn test_duplicate_invite_token_conflicts() {
        let store = InMemoryStore::new();
        let new_invite = NewInviteToken {
            token: "fixed-token".to_string(),
            role: Role::Promoter,
            metadata: InviteMetadata::new(),
            created_by: None,
            expires_at: None,
        };
        store.insert_invite(new_invite.clone()).await.unwrap();
        let again = store.insert_invite(new_invite).await;
        assert!(matches!(again, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_check_in_unique_per_scope() {
        let store = InMemoryStore::new();
        let registration_id = Uuid::new_v4();
        let new_check_in = |scope: &str| NewCheckIn {
            registration_id,
            event_id: Uuid::new_v4(),
            attendee_id: Uuid::new_v4(),
            scope_key: scope.to_string(),
            checked_in_by: Uuid::new_v4(),
        };

        let once = CheckInPolicy::SingleUse.scope_key(Utc::now());
        assert!(store.record_check_in(new_check_in(&once)).await.unwrap().is_some());
        assert!(store.record_check_in(new_check_in(&once)).await.unwrap().is_none());
        assert!(store
            .record_check_in(new_check_in("2026-01-01"))
            .await
            .unwrap()
            .is_some());
        assert_eq!(store.check_in_count(registration_id), 2);

        assert!(store.remove_check_in(registration_id, &once).await.unwrap());
        assert!(!store.remove_check_in(registration_id, &once).await.unwrap());
    }

    #[tokio::test]
    async fn test_roles_listed_per_user() {
        let store = InMemoryStore::new();
        let user = Uuid::new_v4();
        assert!(store
            .upsert_role(user, Role::Promoter, &InviteMetadata::new())
            .await
            .unwrap());
        assert!(!store
            .upsert_role(user, Role::Promoter, &InviteMetadata::new())
            .await
            .unwrap());
        store
            .upsert_role(Uuid::new_v4(), Role::VenueAdmin, &InviteMetadata::new())
            .await
            .unwrap();

        let roles = store.roles_for_user(user).await.unwrap();
        assert_eq!(roles.len(), 1);
        assert_eq!(roles[0].role, Role::Promoter);
    }
}
