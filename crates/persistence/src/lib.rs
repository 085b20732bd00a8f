//! Persistence layer for the CrowdStack access protocol.
//!
//! This crate contains:
//! - Database connection management and migrations
//! - Entity definitions (database row mappings)
//! - PostgreSQL implementations of the domain storage ports

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
