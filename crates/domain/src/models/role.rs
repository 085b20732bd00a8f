//! Roles granted through invites and their landing destinations.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Landing path for signed-in users without a role-specific app.
pub const DEFAULT_LANDING_PATH: &str = "/me";

/// Role that an invite can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    VenueAdmin,
    EventOrganizer,
    Promoter,
    DoorStaff,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::VenueAdmin,
        Role::EventOrganizer,
        Role::Promoter,
        Role::DoorStaff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::VenueAdmin => "venue_admin",
            Role::EventOrganizer => "event_organizer",
            Role::Promoter => "promoter",
            Role::DoorStaff => "door_staff",
        }
    }

    /// App root the user lands on after this role is granted.
    pub fn destination_path(&self) -> &'static str {
        match self {
            Role::VenueAdmin => "/app/venue",
            Role::EventOrganizer => "/app/organizer",
            Role::Promoter => "/app/promoter",
            Role::DoorStaff => "/door",
        }
    }

    /// Lower value wins when a user holds several roles.
    pub fn priority(&self) -> u8 {
        match self {
            Role::VenueAdmin => 0,
            Role::EventOrganizer => 1,
            Role::Promoter => 2,
            Role::DoorStaff => 3,
        }
    }

    /// Returns true if a holder of this role may create invites for `target`.
    pub fn can_invite(&self, target: Role) -> bool {
        match self {
            Role::VenueAdmin => true,
            Role::EventOrganizer => matches!(target, Role::Promoter | Role::DoorStaff),
            Role::Promoter | Role::DoorStaff => false,
        }
    }

    /// Returns true if this role may scan passes and record check-ins.
    pub fn can_scan_door(&self) -> bool {
        matches!(
            self,
            Role::VenueAdmin | Role::EventOrganizer | Role::DoorStaff
        )
    }
}

/// Destination for a role name coming from outside the type system.
pub fn landing_path_for(role_name: &str) -> &'static str {
    role_name
        .parse::<Role>()
        .map(|role| role.destination_path())
        .unwrap_or(DEFAULT_LANDING_PATH)
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "venue_admin" => Ok(Role::VenueAdmin),
            "event_organizer" => Ok(Role::EventOrganizer),
            "promoter" => Ok(Role::Promoter),
            "door_staff" => Ok(Role::DoorStaff),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
