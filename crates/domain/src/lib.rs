//! Domain layer for the CrowdStack backend.
//!
//! This crate contains:
//! - Domain models (roles, invites, invite-QR codes, registrations, check-ins)
//! - Storage ports implemented by the persistence layer
//! - The invite ledger, role assignment and door-pass services

pub mod models;
pub mod services;
