pub mod api;
pub mod backend;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod normalize;
pub mod passthrough;
pub mod query_builder;
pub mod synthetic;

#[cfg(test)]
mod test_support;

pub use error::{GatewayError, Result};
