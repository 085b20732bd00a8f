//! Events referenced by invite-QR codes and registrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An event. Owned by the events subsystem; read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Event {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub starts_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
}

impl Event {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.created_by == user_id
    }
}

/// Event info safe to show to anyone holding an invite code.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PublicEventInfo {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub starts_at: Option<DateTime<Utc>>,
}

impl From<Event> for PublicEventInfo {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            name: event.name,
            slug: event.slug,
            starts_at: event.starts_at,
        }
    }
}
