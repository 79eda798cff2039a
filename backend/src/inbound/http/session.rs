//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Handlers only persist, read, or purge the signed-in operator's id.

use actix_session::Session;
use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::LocalBoxFuture;
use tracing::warn;

use crate::domain::{Error, UserId};

pub(crate) const USER_ID_KEY: &str = "user_id";

/// Newtype wrapper exposing operator-level session operations.
#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// Bind the session to `user_id`, rotating the session key first.
    pub fn persist_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.0.renew();
        self.0
            .insert(USER_ID_KEY, user_id.to_string())
            .map_err(|error| Error::internal(format!("failed to persist session: {error}")))
    }

    /// The signed-in operator, if any. A tampered or stale id reads as
    /// signed out.
    pub fn user_id(&self) -> Result<Option<UserId>, Error> {
        let raw = self
            .0
            .get::<String>(USER_ID_KEY)
            .map_err(|error| Error::internal(format!("failed to read session: {error}")))?;
        Ok(raw.and_then(|value| match UserId::new(&value) {
            Ok(id) => Some(id),
            Err(error) => {
                warn!(%error, "ignoring invalid user id in session cookie");
                None
            }
        }))
    }

    /// Require a signed-in operator or fail with `401 Unauthorized`.
    pub fn require_user_id(&self) -> Result<UserId, Error> {
        self.user_id()?
            .ok_or_else(|| Error::unauthorized("login required"))
    }

    /// Drop all session state.
    pub fn purge(&self) {
        self.0.purge();
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let fut = Session::from_request(req, payload);
        Box::pin(async move { fut.await.map(SessionContext::new) })
    }
}
