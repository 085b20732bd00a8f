//! Role enum shared by the invite_tokens and user_roles tables.

use domain::models::Role;

/// Database enum for invite_role that maps to PostgreSQL enum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "invite_role", rename_all = "snake_case")]
pub enum RoleDb {
    VenueAdmin,
    EventOrganizer,
    Promoter,
    DoorStaff,
}

impl From<RoleDb> for Role {
    fn from(db_role: RoleDb) -> Self {
        match db_role {
            RoleDb::VenueAdmin => Role::VenueAdmin,
            RoleDb::EventOrganizer => Role::EventOrganizer,
            RoleDb::Promoter => Role::Promoter,
            RoleDb::DoorStaff => Role::DoorStaff,
        }
    }
}

impl From<Role> for RoleDb {
    fn from(role: Role) -> Self {
        match role {
            Role::VenueAdmin => RoleDb::VenueAdmin,
            Role::EventOrganizer => RoleDb::EventOrganizer,
            Role::Promoter => RoleDb::Promoter,
            Role::DoorStaff => RoleDb::DoorStaff,
        }
    }
}
