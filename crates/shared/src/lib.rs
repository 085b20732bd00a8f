//! Shared utilities and common types for the CrowdStack backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Opaque token generation and fingerprinting
//! - Signed door-pass tokens
//! - Session token verification for the hosted auth platform

pub mod crypto;
pub mod jwt;
pub mod pass_token;
