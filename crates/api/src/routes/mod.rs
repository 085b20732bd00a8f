//! HTTP route handlers.

pub mod checkins;
pub mod health;
pub mod invite_qr;
pub mod invites;
pub mod me;
pub mod passes;
