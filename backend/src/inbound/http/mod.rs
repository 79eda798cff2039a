//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod commands;
pub mod devices;
pub mod error;
pub mod export;
pub mod health;
pub mod locations;
pub mod responses;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
