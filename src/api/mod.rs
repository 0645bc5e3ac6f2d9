//! HTTP API surface: router, shared state, and route handlers.

pub mod routes;
pub mod server;
