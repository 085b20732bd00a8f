//! Door check-ins recorded after a pass is verified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

/// Scope in which a registration may be checked in only once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInPolicy {
    /// One check-in per registration, ever (until staff reset it).
    #[default]
    SingleUse,
    /// One check-in per registration per UTC calendar day.
    PerEventDay,
}

impl CheckInPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckInPolicy::SingleUse => "single_use",
            CheckInPolicy::PerEventDay => "per_event_day",
        }
    }

    /// Key that check-ins of one registration must be unique on.
    pub fn scope_key(&self, now: DateTime<Utc>) -> String {
        match self {
            CheckInPolicy::SingleUse => "once".to_string(),
            CheckInPolicy::PerEventDay => now.format("%Y-%m-%d").to_string(),
        }
    }
}

impl FromStr for CheckInPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "single_use" => Ok(CheckInPolicy::SingleUse),
            "per_event_day" => Ok(CheckInPolicy::PerEventDay),
            _ => Err(format!("Invalid check-in policy: {}", s)),
        }
    }
}

impl fmt::Display for CheckInPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded check-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckIn {
    pub id: Uuid,
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub attendee_id: Uuid,
    pub scope_key: String,
    pub checked_in_by: Uuid,
    pub checked_in_at: DateTime<Utc>,
}

/// Values needed to record a check-in.
#[derive(Debug, Clone)]
pub struct NewCheckIn {
    pub registration_id: Uuid,
    pub event_id: Uuid,
    pub attendee_id: Uuid,
    pub scope_key: String,
    pub checked_in_by: Uuid,
}

/// Request from a door scanner.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CheckInRequest {
    #[validate(length(min = 1, max = 1024, message = "qr_token must be 1-1024 characters"))]
    pub qr_token: String,
}

/// Response after a successful check-in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckInResponse {
    pub registration_id: Uuid,
    pub attendee_id: Uuid,
    pub attendee_name: String,
    pub checked_in_at: DateTime<Utc>,
}
