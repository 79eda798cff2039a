//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::{ServerConfig, SettingsError, TrackerSettings};

use state_builders::build_http_state;

use std::sync::Arc;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};
use mockable::{Clock, DefaultClock};

use fleet_tracker::Trace;
#[cfg(debug_assertions)]
use fleet_tracker::doc::ApiDoc;
use fleet_tracker::inbound::http::accounts::{login, logout, signup};
use fleet_tracker::inbound::http::commands::{command_ack, device_commands, send_command};
use fleet_tracker::inbound::http::devices::{
    add_device, all_devices, delete_device, device_location, get_device, list_devices,
    live_locations, lost_device, my_devices, register_device, update_device,
};
use fleet_tracker::inbound::http::error::{json_error_handler, path_error_handler, query_error_handler};
use fleet_tracker::inbound::http::export::export_history;
use fleet_tracker::inbound::http::health::{HealthState, live, ready};
use fleet_tracker::inbound::http::locations::{device_history, report_location};
use fleet_tracker::inbound::http::session_config::SessionSettings;
use fleet_tracker::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionSettings,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        session,
    } = deps;

    // `history` must precede the catch-all `/devices/{serial}` routes.
    let api = web::scope("/api")
        .service(signup)
        .service(login)
        .service(logout)
        .service(register_device)
        .service(report_location)
        .service(device_commands)
        .service(command_ack)
        .service(send_command)
        .service(live_locations)
        .service(all_devices)
        .service(my_devices)
        .service(lost_device)
        .service(device_location)
        .service(device_history)
        .service(list_devices)
        .service(add_device)
        .service(get_device)
        .service(update_device)
        .service(delete_device);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .wrap(session.middleware())
        .wrap(Trace)
        .service(api)
        .service(export_history)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server using the provided health state and configuration.
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is bound.
/// - `config`: session settings, bind address, and the optional database pool.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let http_state = build_http_state(&config, clock);
    let ServerConfig {
        session,
        bind_addr,
        db_pool: _,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            session: session.clone(),
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}
