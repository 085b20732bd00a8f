//! Role-granting invite tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::role::Role;

/// Context attached to an invite, e.g. which venue it is scoped to.
pub type InviteMetadata = serde_json::Map<String, serde_json::Value>;

/// A single-use invite token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct InviteToken {
    pub token: String,
    pub role: Role,
    pub metadata: InviteMetadata,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub used_at: Option<DateTime<Utc>>,
    pub used_by: Option<Uuid>,
}

impl InviteToken {
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|exp| exp <= now).unwrap_or(false)
    }
}

/// Values needed to insert a new invite token.
#[derive(Debug, Clone)]
pub struct NewInviteToken {
    pub token: String,
    pub role: Role,
    pub metadata: InviteMetadata,
    pub created_by: Option<Uuid>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Outcome of a successful redemption.
#[derive(Debug, Clone, PartialEq)]
pub struct RedeemedInvite {
    pub role: Role,
    pub metadata: InviteMetadata,
}

/// Returns the first metadata key whose value is not a scalar.
pub fn find_non_scalar_key(metadata: &InviteMetadata) -> Option<&str> {
    metadata
        .iter()
        .find(|(_, v)| v.is_array() || v.is_object())
        .map(|(k, _)| k.as_str())
}

/// Request to create a new invite.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateInviteRequest {
    pub role: Role,

    #[serde(default)]
    pub metadata: InviteMetadata,

    /// Hours until expiry (1-720). Omit for an invite that never expires.
    #[validate(range(
        min = 1,
        max = 720,
        message = "expires_in_hours must be between 1 and 720"
    ))]
    pub expires_in_hours: Option<i64>,
}

/// Response after creating an invite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CreateInviteResponse {
    pub token: String,
    pub role: Role,
    pub metadata: InviteMetadata,
    pub expires_at: Option<DateTime<Utc>>,
    pub invite_url: String,
}

/// Public invite preview (GET /invites/:token).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct InvitePreview {
    pub valid: bool,
    pub role: Role,
    pub metadata: InviteMetadata,
}

/// Response after redeeming an invite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RedeemInviteResponse {
    pub role: Role,
    pub redirect_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    fn sample(expires_at: Option<DateTime<Utc>>) -> InviteToken {
        InviteToken {
            token: "tok".to_string(),
            role: Role::Promoter,
            metadata: InviteMetadata::new(),
            created_by: None,
            created_at: Utc::now(),
            expires_at,
            used_at: None,
            used_by: None,
        }
    }

    #[test]
    fn test_expiry_boundaries() {
        let now = Utc::now();
        assert!(!sample(None).is_expired_at(now));
        assert!(!sample(Some(now + Duration::seconds(1))).is_expired_at(now));
        assert!(sample(Some(now)).is_expired_at(now));
        assert!(sample(Some(now - Duration::hours(1))).is_expired_at(now));
    }

    #[test]
    fn test_find_non_scalar_key() {
        let scalar = json!({"venue_id": "v-1", "capacity": 40, "vip": true, "note": null});
        assert_eq!(find_non_scalar_key(scalar.as_object().unwrap()), None);

        let nested = json!({"venue_id": "v-1", "tags": ["a", "b"]});
        assert_eq!(find_non_scalar_key(nested.as_object().unwrap()), Some("tags"));
    }

    #[test]
    fn test_create_invite_request_validation() {
        let request: CreateInviteRequest = serde_json::from_value(json!({
            "role": "promoter",
            "expires_in_hours": 48
        }))
        .unwrap();
        assert!(request.validate().is_ok());
        assert!(request.metadata.is_empty());

        let too_long: CreateInviteRequest = serde_json::from_value(json!({
            "role": "door_staff",
            "expires_in_hours": 10_000
        }))
        .unwrap();
        assert!(too_long.validate().is_err());
    }

    #[test]
    fn test_unknown_role_fails_to_deserialize() {
        let result: Result<CreateInviteRequest, _> =
            serde_json::from_value(json!({"role": "superuser"}));
        assert!(result.is_err());
    }
}
