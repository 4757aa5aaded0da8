//! HTTP adapter: bearer authentication, per-route authorization, wiring.

pub mod app;
pub mod authz;
pub mod config;
pub mod middleware;
