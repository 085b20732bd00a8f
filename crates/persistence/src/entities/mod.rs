//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod check_in;
pub mod event;
pub mod invite_qr_code;
pub mod invite_token;
pub mod metadata;
pub mod registration;
pub mod role;
pub mod user_role;

pub use check_in::CheckInEntity;
pub use event::EventEntity;
pub use invite_qr_code::InviteQrCodeEntity;
pub use invite_token::InviteTokenEntity;
pub use metadata::{metadata_from_json, metadata_to_json};
pub use registration::RegistrationWithAttendeeEntity;
pub use role::RoleDb;
pub use user_role::UserRoleEntity;
