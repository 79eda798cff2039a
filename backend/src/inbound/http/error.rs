//! HTTP adapter mapping for domain errors.
//!
//! Keeps the domain error type HTTP-agnostic while letting Actix handlers
//! turn failures into consistent JSON responses and status codes.

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if !matches!(error.code(), ErrorCode::InternalError) {
        return error.clone();
    }
    error!(message = error.message(), "internal error returned to client");
    let redacted = Error::internal("Internal server error");
    match error.trace_id() {
        Some(id) => redacted.with_trace_id(id.to_owned()),
        None => redacted,
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }
        builder.json(redact_if_internal(self))
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Error::internal("Internal server error")
    }
}

fn malformed(kind: &str, detail: String) -> Error {
    Error::invalid_request(format!("malformed {kind}"))
        .with_details(json!({ "code": "malformed_payload", "reason": detail }))
}

/// `JsonConfig` error handler: malformed bodies become `400` domain errors.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    malformed("JSON body", err.to_string()).into()
}

/// `QueryConfig` error handler.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    malformed("query string", err.to_string()).into()
}

/// `PathConfig` error handler.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    malformed("path", err.to_string()).into()
}

#[cfg(test)]
mod tests;
