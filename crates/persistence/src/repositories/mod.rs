//! Repository implementations for database operations.
//!
//! Each repository implements one of the storage ports in
//! `domain::services::store`.

pub mod check_in;
pub mod event;
pub mod invite_qr_code;
pub mod invite_token;
pub mod registration;
pub mod user_role;

pub use check_in::CheckInRepository;
pub use event::EventRepository;
pub use invite_qr_code::InviteQrCodeRepository;
pub use invite_token::InviteTokenRepository;
pub use registration::RegistrationRepository;
pub use user_role::UserRoleRepository;
