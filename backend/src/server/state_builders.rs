//! Builders wiring the driving ports onto PostgreSQL or the in-memory store.

use std::sync::Arc;

use actix_web::web;
use mockable::Clock;

use fleet_tracker::domain::ports::{
    CommandRepository, DeviceRepository, LocationRepository, UserRepository,
};
use fleet_tracker::domain::{
    AccountsService, CommandQueueService, DeviceRegistryService, LocationLedgerService,
};
use fleet_tracker::inbound::http::state::HttpState;
use fleet_tracker::outbound::memory::InMemoryFleetStore;
use fleet_tracker::outbound::password::Argon2PasswordHasher;
use fleet_tracker::outbound::persistence::{
    DbPool, DieselCommandRepository, DieselDeviceRepository, DieselLocationRepository,
    DieselUserRepository,
};

use super::ServerConfig;

/// Wire the four services over one set of repositories.
fn wire_services<U, D, L, C>(
    users: Arc<U>,
    devices: Arc<D>,
    locations: Arc<L>,
    commands: Arc<C>,
    clock: Arc<dyn Clock>,
) -> HttpState
where
    U: UserRepository + 'static,
    D: DeviceRepository + 'static,
    L: LocationRepository + 'static,
    C: CommandRepository + 'static,
{
    HttpState::new(
        Arc::new(AccountsService::new(
            users,
            Arc::new(Argon2PasswordHasher::new()),
        )),
        Arc::new(DeviceRegistryService::new(devices.clone(), clock.clone())),
        Arc::new(LocationLedgerService::new(
            devices.clone(),
            locations,
            clock.clone(),
        )),
        Arc::new(CommandQueueService::new(devices, commands, clock)),
    )
}

fn diesel_state(pool: &DbPool, clock: Arc<dyn Clock>) -> HttpState {
    wire_services(
        Arc::new(DieselUserRepository::new(pool.clone())),
        Arc::new(DieselDeviceRepository::new(pool.clone())),
        Arc::new(DieselLocationRepository::new(pool.clone())),
        Arc::new(DieselCommandRepository::new(pool.clone())),
        clock,
    )
}

fn in_memory_state(clock: Arc<dyn Clock>) -> HttpState {
    let store = Arc::new(InMemoryFleetStore::new());
    wire_services(store.clone(), store.clone(), store.clone(), store, clock)
}

/// Build the shared HTTP state, backed by PostgreSQL when a pool is
/// configured and by a process-local store otherwise.
pub(super) fn build_http_state(
    config: &ServerConfig,
    clock: Arc<dyn Clock>,
) -> web::Data<HttpState> {
    let state = match &config.db_pool {
        Some(pool) => diesel_state(pool, clock),
        None => in_memory_state(clock),
    };
    web::Data::new(state)
}
