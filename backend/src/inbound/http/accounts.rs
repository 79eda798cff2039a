//! Operator account handlers.
//!
//! ```text
//! POST /api/signup {"username":"ops","email":"ops@fleet.test","password":"..."}
//! POST /api/login  {"email":"ops@fleet.test","password":"..."}
//! POST /api/logout
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::{Error, LoginCredentials, SignupDetails, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::auth_validation_error;

/// Signup request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Identifier of the account that signed up or in.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub message: String,
}

/// Create an operator account.
#[utoipa::path(
    post,
    path = "/api/signup",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Username or email already registered", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    payload: web::Json<SignupRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let SignupRequest {
        username,
        email,
        password,
    } = payload.into_inner();
    let details = SignupDetails::try_from_parts(&username, &email, &password)
        .map_err(auth_validation_error)?;
    let user = state.accounts.signup(details).await?;
    Ok(web::Json(AccountResponse {
        id: user.id,
        message: "Account created".to_owned(),
    }))
}

/// Authenticate and bind the session to the operator.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = AccountResponse,
            headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<AccountResponse>> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(auth_validation_error)?;
    let user = state.accounts.login(&credentials).await?;
    session.persist_user(&user.id)?;
    info!(user_id = %user.id, "operator signed in");
    Ok(web::Json(AccountResponse {
        id: user.id,
        message: "Logged in".to_owned(),
    }))
}

/// End the current session.
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 204, description = "Session cleared"),
        (status = 401, description = "Not signed in", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "logout",
    security(("SessionCookie" = []))
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    session.require_user_id()?;
    session.purge();
    Ok(HttpResponse::NoContent().finish())
}
