//! Door passes: ownership-gated issuance and staff check-in.

use chrono::Utc;
use shared::pass_token::{PassTokenCodec, PassTokenError};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::store::{CheckInStore, RegistrationStore, StoreError, UserRoleStore};
use crate::models::{CheckIn, CheckInPolicy, NewCheckIn, Registration};

#[derive(Debug, Error)]
pub enum DoorPassError {
    #[error("Registration not found")]
    NotFound,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid pass: {0}")]
    InvalidPass(PassTokenError),

    #[error("Pass is for a different event")]
    WrongEvent,

    #[error("Registration has already been checked in")]
    AlreadyCheckedIn,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a successful check-in.
#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub check_in: CheckIn,
    pub registration: Registration,
}

#[derive(Clone)]
pub struct DoorPassService {
    registrations: Arc<dyn RegistrationStore>,
    check_ins: Arc<dyn CheckInStore>,
    roles: Arc<dyn UserRoleStore>,
    codec: Arc<PassTokenCodec>,
}

impl DoorPassService {
    pub fn new(
        registrations: Arc<dyn RegistrationStore>,
        check_ins: Arc<dyn CheckInStore>,
        roles: Arc<dyn UserRoleStore>,
        codec: Arc<PassTokenCodec>,
    ) -> Self {
        Self {
            registrations,
            check_ins,
            roles,
            codec,
        }
    }

    /// Issue a pass token for a registration owned by `requester`.
    pub async fn issue_pass(
        &self,
        registration_id: Uuid,
        requester: Uuid,
    ) -> Result<String, DoorPassError> {
        let registration = self
            .registrations
            .find_registration(registration_id)
            .await?
            .ok_or(DoorPassError::NotFound)?;

        if !registration.attendee.is_owned_by(requester) {
            warn!(
                registration_id = %registration_id,
                requester = %requester,
                "Pass requested by non-owner"
            );
            return Err(DoorPassError::Forbidden(
                "Registration does not belong to you".to_string(),
            ));
        }

        Ok(self.codec.generate(
            registration.id,
            registration.event_id,
            registration.attendee.id,
        ))
    }

    /// Verify a scanned pass and record the check-in.
    pub async fn check_in(
        &self,
        token: &str,
        event_id: Uuid,
        staff_id: Uuid,
        policy: CheckInPolicy,
    ) -> Result<CheckInOutcome, DoorPassError> {
        self.ensure_door_staff(staff_id, event_id).await?;

        let claims = self.codec.verify(token).map_err(|e| {
            warn!(reason = e.reason(), event_id = %event_id, "Pass verification failed");
            DoorPassError::InvalidPass(e)
        })?;

        if claims.event_id != event_id {
            warn!(
                registration_id = %claims.registration_id,
                event_id = %event_id,
                "Pass presented at the wrong event"
            );
            return Err(DoorPassError::WrongEvent);
        }

        // The token may outlive the registration it names.
        let registration = self
            .registrations
            .find_registration(claims.registration_id)
            .await?
            .filter(|r| r.event_id == claims.event_id && r.attendee.id == claims.attendee_id)
            .ok_or(DoorPassError::NotFound)?;

        let new_check_in = NewCheckIn {
            registration_id: registration.id,
            event_id,
            attendee_id: registration.attendee.id,
            scope_key: policy.scope_key(Utc::now()),
            checked_in_by: staff_id,
        };

        let check_in = self
            .check_ins
            .record_check_in(new_check_in)
            .await?
            .ok_or(DoorPassError::AlreadyCheckedIn)?;

        info!(
            registration_id = %registration.id,
            event_id = %event_id,
            policy = %policy,
            "Attendee checked in"
        );
        Ok(CheckInOutcome {
            check_in,
            registration,
        })
    }

    /// Return a registration to not-checked-in for the current scope.
    pub async fn reset_check_in(
        &self,
        registration_id: Uuid,
        event_id: Uuid,
        staff_id: Uuid,
        policy: CheckInPolicy,
    ) -> Result<(), DoorPassError> {
        self.ensure_door_staff(staff_id, event_id).await?;

        let registration = self
            .registrations
            .find_registration(registration_id)
            .await?
            .filter(|r| r.event_id == event_id)
            .ok_or(DoorPassError::NotFound)?;

        let removed = self
            .check_ins
            .remove_check_in(registration.id, &policy.scope_key(Utc::now()))
            .await?;
        if !removed {
            return Err(DoorPassError::NotFound);
        }

        info!(
            registration_id = %registration_id,
            staff_id = %staff_id,
            "Check-in reset"
        );
        Ok(())
    }

    /// A scanning grant whose metadata names an `event_id` only covers that
    /// event. Grants without one cover every event.
    async fn ensure_door_staff(&self, user_id: Uuid, event_id: Uuid) -> Result<(), DoorPassError> {
        let roles = self.roles.roles_for_user(user_id).await?;
        let mut scoped_elsewhere = false;

        for grant in roles.iter().filter(|grant| grant.role.can_scan_door()) {
            let scope = grant.metadata.get("event_id");
            match scope.and_then(|v| v.as_str()).map(Uuid::parse_str) {
                None if scope.is_none() => {
                    debug!(
                        staff_id = %user_id,
                        event_id = %event_id,
                        role = %grant.role,
                        "Unscoped door grant used"
                    );
                    return Ok(());
                }
                Some(Ok(scoped)) if scoped == event_id => return Ok(()),
                _ => scoped_elsewhere = true,
            }
        }

        if scoped_elsewhere {
            warn!(
                staff_id = %user_id,
                event_id = %event_id,
                "Door grant is scoped to a different event"
            );
        }
        Err(DoorPassError::Forbidden(
            "Door staff role required".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InviteMetadata, Role};
    use crate::services::memory::InMemoryStore;

    const SECRET: &str = "door-pass-test-secret-0123456789abcdef";

    struct Fixture {
        store: Arc<InMemoryStore>,
        service: DoorPassService,
        staff: Uuid,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(InMemoryStore::new());
        let codec = Arc::new(PassTokenCodec::new(SECRET, None).unwrap());
        let service = DoorPassService::new(store.clone(), store.clone(), store.clone(), codec);

        let staff = Uuid::new_v4();
        store
            .upsert_role(staff, Role::DoorStaff, &InviteMetadata::new())
            .await
            .unwrap();

        Fixture {
            store,
            service,
            staff,
        }
    }

    #[tokio::test]
    async fn test_issue_pass_requires_owner() {
        let f = fixture().await;
        let owner = Uuid::new_v4();
        let event = f.store.add_event("Gala", Uuid::new_v4());
        let registration = f.store.add_registration(event.id, "Alex", Some(owner));

        let token = f.service.issue_pass(registration.id, owner).await.unwrap();
        assert!(token.starts_with("v1."));

        let other = f.service.issue_pass(registration.id, Uuid::new_v4()).await;
        assert!(matches!(other, Err(DoorPassError::Forbidden(_))));

        let missing = f.service.issue_pass(Uuid::new_v4(), owner).await;
        assert!(matches!(missing, Err(DoorPassError::NotFound)));
    }

    #[tokio::test]
    async fn test_unclaimed_registration_is_forbidden() {
        let f = fixture().await;
        let event = f.store.add_event("Gala", Uuid::new_v4());
        let registration = f.store.add_registration(event.id, "Walk-in", None);

        let result = f.service.issue_pass(registration.id, Uuid::nil()).await;
        assert!(matches!(result, Err(DoorPassError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_check_in_replay_and_reset() {
        let f = fixture().await;
        let owner = Uuid::new_v4();
        let event = f.store.add_event("Club Night", Uuid::new_v4());
        let registration = f.store.add_registration(event.id, "Jordan", Some(owner));
        let token = f.service.issue_pass(registration.id, owner).await.unwrap();

        let outcome = f
            .service
            .check_in(&token, event.id, f.staff, CheckInPolicy::SingleUse)
            .await
            .unwrap();
        assert_eq!(outcome.check_in.registration_id, registration.id);
        assert_eq!(outcome.registration.attendee.name, "Jordan");

        let replay = f
            .service
            .check_in(&token, event.id, f.staff, CheckInPolicy::SingleUse)
            .await;
        assert!(matches!(replay, Err(DoorPassError::AlreadyCheckedIn)));

        f.service
            .reset_check_in(registration.id, event.id, f.staff, CheckInPolicy::SingleUse)
            .await
            .unwrap();

        assert!(f
            .service
            .check_in(&token, event.id, f.staff, CheckInPolicy::SingleUse)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_event_scoped_grant_only_covers_its_event() {
        let f = fixture().await;
        let owner = Uuid::new_v4();
        let event = f.store.add_event("Night One", Uuid::new_v4());
        let elsewhere = f.store.add_event("Night Two", Uuid::new_v4());
        let registration = f.store.add_registration(event.id, "Sam", Some(owner));
        let token = f.service.issue_pass(registration.id, owner).await.unwrap();

        let scoped_staff = Uuid::new_v4();
        let metadata = serde_json::json!({"event_id": elsewhere.id.to_string()})
            .as_object()
            .cloned()
            .unwrap();
        f.store
            .upsert_role(scoped_staff, Role::DoorStaff, &metadata)
            .await
            .unwrap();

        let denied = f
            .service
            .check_in(&token, event.id, scoped_staff, CheckInPolicy::SingleUse)
            .await;
        assert!(matches!(denied, Err(DoorPassError::Forbidden(_))));

        let own_staff = Uuid::new_v4();
        let metadata = serde_json::json!({"event_id": event.id.to_string()})
            .as_object()
            .cloned()
            .unwrap();
        f.store
            .upsert_role(own_staff, Role::DoorStaff, &metadata)
            .await
            .unwrap();

        assert!(f
            .service
            .check_in(&token, event.id, own_staff, CheckInPolicy::SingleUse)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_reset_without_check_in_is_not_found() {
        let f = fixture().await;
        let event = f.store.add_event("Club Night", Uuid::new_v4());
        let registration = f.store.add_registration(event.id, "Jordan", None);

        let result = f
            .service
            .reset_check_in(registration.id, event.id, f.staff, CheckInPolicy::SingleUse)
            .await;
        assert!(matches!(result, Err(DoorPassError::NotFound)));
    }

    #[tokio::test]
    async fn test_pass_for_other_event_rejected() {
        let f = fixture().await;
        let owner = Uuid::new_v4();
        let event = f.store.add_event("Day One", Uuid::new_v4());
        let other_event = f.store.add_event("Day Two", Uuid::new_v4());
        let registration = f.store.add_registration(event.id, "Riley", Some(owner));
        let token = f.service.issue_pass(registration.id, owner).await.unwrap();

        let result = f
            .service
            .check_in(&token, other_event.id, f.staff, CheckInPolicy::SingleUse)
            .await;
        assert!(matches!(result, Err(DoorPassError::WrongEvent)));
    }

    #[tokio::test]
    async fn test_tampered_pass_rejected() {
        let f = fixture().await;
        let owner = Uuid::new_v4();
        let event = f.store.add_event("Expo", Uuid::new_v4());
        let registration = f.store.add_registration(event.id, "Casey", Some(owner));
        let mut token = f.service.issue_pass(registration.id, owner).await.unwrap();
        let last = token.pop().unwrap();
        token.push(if last == '0' { '1' } else { '0' });

        let result = f
            .service
            .check_in(&token, event.id, f.staff, CheckInPolicy::SingleUse)
            .await;
        assert!(matches!(
            result,
            Err(DoorPassError::InvalidPass(PassTokenError::SignatureMismatch))
        ));
    }

    #[tokio::test]
    async fn test_check_in_requires_staff_role() {
        let f = fixture().await;
        let owner = Uuid::new_v4();
        let event = f.store.add_event("Expo", Uuid::new_v4());
        let registration = f.store.add_registration(event.id, "Casey", Some(owner));
        let token = f.service.issue_pass(registration.id, owner).await.unwrap();

        let promoter = Uuid::new_v4();
        f.store
            .upsert_role(promoter, Role::Promoter, &InviteMetadata::new())
            .await
            .unwrap();

        for user in [owner, promoter] {
            let result = f
                .service
                .check_in(&token, event.id, user, CheckInPolicy::SingleUse)
                .await;
            assert!(matches!(result, Err(DoorPassError::Forbidden(_))));
        }
    }

    #[tokio::test]
    async fn test_per_event_day_policy_uses_distinct_scope() {
        let f = fixture().await;
        let owner = Uuid::new_v4();
        let event = f.store.add_event("Weekender", Uuid::new_v4());
        let registration = f.store.add_registration(event.id, "Morgan", Some(owner));
        let token = f.service.issue_pass(registration.id, owner).await.unwrap();

        f.service
            .check_in(&token, event.id, f.staff, CheckInPolicy::SingleUse)
            .await
            .unwrap();

        // A single-use check-in does not count toward today's scope.
        let outcome = f
            .service
            .check_in(&token, event.id, f.staff, CheckInPolicy::PerEventDay)
            .await
            .unwrap();
        assert_eq!(
            outcome.check_in.scope_key,
            CheckInPolicy::PerEventDay.scope_key(outcome.check_in.checked_in_at)
        );
    }
}
