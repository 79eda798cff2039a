//! Fleet tracker library: domain model, HTTP adapter, and storage adapters.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;

#[cfg(test)]
mod test_support;
