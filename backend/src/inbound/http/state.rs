//! Shared HTTP adapter state.
//!
//! Handlers receive this through `actix_web::web::Data` and only see driving
//! ports, so they stay testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{AccountService, CommandQueue, DeviceRegistry, LocationLedger};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: Arc<dyn AccountService>,
    pub devices: Arc<dyn DeviceRegistry>,
    pub locations: Arc<dyn LocationLedger>,
    pub commands: Arc<dyn CommandQueue>,
}

impl HttpState {
    /// Bundle the driving ports.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use fleet_tracker::domain::{
    ///     AccountsService, CommandQueueService, DeviceRegistryService, LocationLedgerService,
    /// };
    /// use fleet_tracker::inbound::http::state::HttpState;
    /// use fleet_tracker::outbound::memory::InMemoryFleetStore;
    /// use fleet_tracker::outbound::password::Argon2PasswordHasher;
    /// use mockable::{Clock, DefaultClock};
    ///
    /// let store = Arc::new(InMemoryFleetStore::new());
    /// let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    /// let state = HttpState::new(
    ///     Arc::new(AccountsService::new(store.clone(), Arc::new(Argon2PasswordHasher::new()))),
    ///     Arc::new(DeviceRegistryService::new(store.clone(), clock.clone())),
    ///     Arc::new(LocationLedgerService::new(store.clone(), store.clone(), clock.clone())),
    ///     Arc::new(CommandQueueService::new(store.clone(), store, clock)),
    /// );
    /// let _devices = state.devices.clone();
    /// ```
    pub fn new(
        accounts: Arc<dyn AccountService>,
        devices: Arc<dyn DeviceRegistry>,
        locations: Arc<dyn LocationLedger>,
        commands: Arc<dyn CommandQueue>,
    ) -> Self {
        Self {
            accounts,
            devices,
            locations,
            commands,
        }
    }
}
