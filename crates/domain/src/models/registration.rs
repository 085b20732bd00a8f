//! Registrations and attendees, referenced by door passes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Attendee linked to a registration. `user_id` is set once the attendee
/// has claimed the registration with an account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Attendee {
    pub id: Uuid,
    pub name: String,
    pub user_id: Option<Uuid>,
}

impl Attendee {
    /// Strict ownership check. An attendee without a linked account is owned
    /// by nobody.
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == Some(user_id)
    }
}

/// One attendee registered for one event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Registration {
    pub id: Uuid,
    pub event_id: Uuid,
    pub attendee: Attendee,
    pub created_at: DateTime<Utc>,
}

/// Response carrying a door-pass token.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PassResponse {
    pub qr_token: String,
}
