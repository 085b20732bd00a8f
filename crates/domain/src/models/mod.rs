//! Domain models for CrowdStack.

pub mod check_in;
pub mod event;
pub mod invite;
pub mod invite_qr_code;
pub mod registration;
pub mod role;
pub mod user_role;

pub use check_in::{CheckIn, CheckInPolicy, NewCheckIn};
pub use event::{Event, PublicEventInfo};
pub use invite::{InviteMetadata, InviteToken, NewInviteToken, RedeemedInvite};
pub use invite_qr_code::{InviteQrCode, NewInviteQrCode};
pub use registration::{Attendee, Registration};
pub use role::{Role, DEFAULT_LANDING_PATH};
pub use user_role::UserRole;
