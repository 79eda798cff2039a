//! Tests for HTTP error mapping.

use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use actix_web::{App, ResponseError, test as actix_test, web};
use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::json;

use super::*;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_error() -> Error {
    Error::internal("pool exhausted at 10.0.0.4")
        .with_trace_id(TRACE_ID)
        .with_details(json!({"secret": "x"}))
}

async fn decode(error: &Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let payload = serde_json::from_slice(&bytes).expect("error JSON deserialises");
    (status, header, payload)
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("login required"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("not yours"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("duplicate serial"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] expected: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), expected);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_trace_id(internal_error: Error) {
    let (status, header, payload) = decode(&internal_error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(payload.message(), "Internal server error");
    assert_eq!(payload.trace_id(), Some(TRACE_ID));
    assert!(payload.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn client_errors_keep_message_and_details() {
    let error = Error::conflict("device DEV-1 is already registered")
        .with_details(json!({"serialNumber": "DEV-1"}));

    let (status, header, payload) = decode(&error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(header.is_none());
    assert_eq!(payload.code(), ErrorCode::Conflict);
    assert_eq!(payload.message(), "device DEV-1 is already registered");
    assert_eq!(payload.details(), Some(&json!({"serialNumber": "DEV-1"})));
}

#[rstest]
fn actix_errors_become_redacted_internal_errors() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
}

#[derive(Deserialize)]
struct Body {
    #[expect(dead_code, reason = "only deserialisation is exercised")]
    serial_number: String,
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let app = actix_test::init_service(
        App::new()
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .route(
                "/",
                web::post().to(|_body: web::Json<Body>| async { "ok" }),
            ),
    )
    .await;
    let req = actix_test::TestRequest::post()
        .uri("/")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"serial_number\": ")
        .to_request();

    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let payload: Error = actix_test::read_body_json(res).await;
    assert_eq!(payload.code(), ErrorCode::InvalidRequest);
    assert_eq!(payload.message(), "malformed JSON body");
}
