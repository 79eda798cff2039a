//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: a process-local store used when no database is configured
//! - **password**: Argon2 password hashing
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod memory;
pub mod password;
pub mod persistence;
