//! # Duolog API
//!
//! HTTP surface for duolog: starting live debates and streaming them
//! over SSE, launching benchmark evaluations, and browsing persisted
//! runs, logs, and comparisons.

pub mod debate;
pub mod error;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_util;

pub use error::{ApiError, ApiResult};
pub use server::{init_tracing, Server, ServerConfig};
pub use state::AppState;
