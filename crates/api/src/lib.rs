//! HTTP API: configuration, routing, request/response mapping and the server lifecycle.

pub mod app;
pub mod config;
pub mod context;
pub mod lifecycle;
pub mod middleware;
pub mod server;
