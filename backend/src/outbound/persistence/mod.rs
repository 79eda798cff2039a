//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repository implementations only translate between Diesel rows and domain
//! types; no business rules live here. Row structs (`models.rs`) and table
//! definitions (`schema.rs`) stay private to this module. Connections come
//! from a `bb8` pool through `diesel-async`, and every database failure is
//! mapped to the owning port's error type.

mod diesel_basic_error_mapping;
mod diesel_command_repository;
mod diesel_device_repository;
mod diesel_location_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_command_repository::DieselCommandRepository;
pub use diesel_device_repository::DieselDeviceRepository;
pub use diesel_location_repository::DieselLocationRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
