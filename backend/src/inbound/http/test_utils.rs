//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test as actix_test, web};
use mockable::Clock;
use serde_json::json;

use crate::domain::{
    AccountsService, CommandQueueService, DeviceRegistryService, LocationLedgerService,
    SignupDetails, UserId,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::{accounts, commands, devices, error, export, locations};
use crate::outbound::memory::InMemoryFleetStore;
use crate::outbound::password::Argon2PasswordHasher;

/// Password used by [`sign_in`].
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Session middleware with a fresh key and the `Secure` flag off so plain
/// HTTP test requests keep their cookie.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Extract the session cookie set by a response.
pub fn session_cookie<B>(response: &ServiceResponse<B>) -> Cookie<'static> {
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie set")
        .into_owned()
}

/// Real services over one shared in-memory store.
pub fn in_memory_state(clock: Arc<dyn Clock>) -> HttpState {
    let store = Arc::new(InMemoryFleetStore::new());
    HttpState::new(
        Arc::new(AccountsService::new(
            Arc::clone(&store),
            Arc::new(Argon2PasswordHasher::new()),
        )),
        Arc::new(DeviceRegistryService::new(
            Arc::clone(&store),
            Arc::clone(&clock),
        )),
        Arc::new(LocationLedgerService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::clone(&clock),
        )),
        Arc::new(CommandQueueService::new(
            Arc::clone(&store),
            store,
            clock,
        )),
    )
}

/// Every API and export route behind a test session middleware.
pub fn api_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .wrap(test_session_middleware())
        .service(
            web::scope("/api")
                .service(accounts::signup)
                .service(accounts::login)
                .service(accounts::logout)
                .service(devices::register_device)
                .service(devices::add_device)
                .service(devices::list_devices)
                .service(locations::device_history)
                .service(devices::get_device)
                .service(devices::update_device)
                .service(devices::delete_device)
                .service(devices::device_location)
                .service(devices::live_locations)
                .service(devices::all_devices)
                .service(devices::my_devices)
                .service(devices::lost_device)
                .service(locations::report_location)
                .service(commands::send_command)
                .service(commands::device_commands)
                .service(commands::command_ack),
        )
        .service(export::export_history)
}

/// Create `username` through the account port and log in over HTTP,
/// returning the session cookie.
pub async fn sign_in<S, B, E>(app: &S, state: &HttpState, username: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = E>,
    E: std::fmt::Debug,
{
    sign_in_as(app, state, username).await.0
}

/// Like [`sign_in`], also returning the new account's id.
pub async fn sign_in_as<S, B, E>(
    app: &S,
    state: &HttpState,
    username: &str,
) -> (Cookie<'static>, UserId)
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = E>,
    E: std::fmt::Debug,
{
    let email = format!("{username}@fleet.test");
    let details =
        SignupDetails::try_from_parts(username, &email, TEST_PASSWORD).expect("signup details");
    let user = state.accounts.signup(details).await.expect("signup");

    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/login")
            .set_json(json!({"email": email, "password": TEST_PASSWORD}))
            .to_request(),
    )
    .await;
    assert!(res.status().is_success(), "login failed: {}", res.status());
    (session_cookie(&res), user.id)
}
