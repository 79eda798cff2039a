//! Request-scoped trace identifier for correlation across logs and errors.
//!
//! The identifier lives in task-local storage so services and error
//! constructors can read it without explicit parameter threading. Tokio
//! task-locals are not inherited by spawned tasks; wrap spawned work in
//! [`TraceId::scope`] to carry the identifier along.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

/// Response (and accepted request) header carrying the trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

task_local! {
    static TRACE_ID: TraceId;
}

/// Per-request trace identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use fleet_tracker::domain::TraceId;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let trace_id: TraceId = "00000000-0000-0000-0000-000000000000"
///     .parse()
///     .expect("valid UUID");
/// let observed = TraceId::scope(trace_id, async move { TraceId::current() }).await;
/// assert_eq!(observed, Some(trace_id));
/// # });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new random trace identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reuse a caller-supplied identifier when it is a valid UUID, otherwise
    /// mint a fresh one.
    #[must_use]
    pub fn from_header_or_generate(raw: Option<&str>) -> Self {
        raw.and_then(|value| value.trim().parse().ok())
            .unwrap_or_else(Self::generate)
    }

    /// Returns the current trace identifier if one is in scope.
    #[must_use]
    pub fn current() -> Option<Self> {
        TRACE_ID.try_with(|id| *id).ok()
    }

    /// Execute the provided future with the supplied trace identifier in scope.
    pub async fn scope<Fut>(trace_id: TraceId, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        TRACE_ID.scope(trace_id, fut).await
    }
}

impl std::fmt::Display for TraceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TraceId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
