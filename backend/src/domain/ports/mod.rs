//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod account_service;
mod command_queue;
mod command_repository;
mod device_registry;
mod device_repository;
mod location_ledger;
mod location_repository;
mod password_hasher;
mod user_repository;

#[cfg(test)]
pub use account_service::MockAccountService;
pub use account_service::AccountService;
#[cfg(test)]
pub use command_queue::MockCommandQueue;
pub use command_queue::{CommandQueue, EnqueueCommandRequest};
#[cfg(test)]
pub use command_repository::MockCommandRepository;
pub use command_repository::{
    AckOutcome, CommandRepository, CommandRepositoryError, FixtureCommandRepository,
};
#[cfg(test)]
pub use device_registry::MockDeviceRegistry;
pub use device_registry::{DeviceOverview, DeviceRegistry, RegisterDeviceRequest};
#[cfg(test)]
pub use device_repository::MockDeviceRepository;
pub use device_repository::{DeviceRepository, DeviceRepositoryError, FixtureDeviceRepository};
#[cfg(test)]
pub use location_ledger::MockLocationLedger;
pub use location_ledger::{LocationLedger, ReportLocationRequest};
#[cfg(test)]
pub use location_repository::MockLocationRepository;
pub use location_repository::{
    FixtureLocationRepository, LocationRepository, LocationRepositoryError,
};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{FixtureUserRepository, UserRepository, UserRepositoryError};
