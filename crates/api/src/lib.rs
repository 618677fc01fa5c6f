//! HTTP API: axum adapter around the authorization gate.

pub mod app;
pub mod config;
pub mod context;
pub mod middleware;
