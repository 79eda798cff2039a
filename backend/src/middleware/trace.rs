//! Tracing middleware attaching a request-scoped trace identifier.
//!
//! A valid UUID in the incoming `trace-id` header is reused so device and
//! agent logs correlate with server logs; otherwise a fresh one is minted.
//! The identifier lives in task-local storage for the duration of the
//! request and is echoed in the `trace-id` response header.

use std::task::{Context, Poll};

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::{HeaderName, HeaderValue};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use tracing::{Instrument, error, info_span};

use crate::domain::{TRACE_ID_HEADER, TraceId};

/// Tracing middleware.
///
/// Handlers read the identifier through [`TraceId::current`].
///
/// # Examples
/// ```
/// use actix_web::App;
/// use fleet_tracker::Trace;
///
/// let app = App::new().wrap(Trace);
/// ```
#[derive(Clone)]
pub struct Trace;

impl<S, B> Transform<S, ServiceRequest> for Trace
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TraceMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TraceMiddleware { service }))
    }
}

/// Service wrapper produced by [`Trace`].
pub struct TraceMiddleware<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for TraceMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let inbound = req
            .headers()
            .get(TRACE_ID_HEADER)
            .and_then(|value| value.to_str().ok());
        let trace_id = TraceId::from_header_or_generate(inbound);
        let span = info_span!(
            "request",
            trace_id = %trace_id,
            method = %req.method(),
            path = req.path()
        );
        let header_value = trace_id.to_string();
        let fut = span.in_scope(|| self.service.call(req));
        Box::pin(
            TraceId::scope(trace_id, async move {
                let mut res = fut.await?;
                match HeaderValue::from_str(&header_value) {
                    Ok(value) => {
                        res.response_mut()
                            .headers_mut()
                            .insert(HeaderName::from_static(TRACE_ID_HEADER), value);
                    }
                    Err(error) => {
                        error!(%error, "failed to encode trace identifier header");
                    }
                }
                Ok(res)
            })
            .instrument(span),
        )
    }
}
