//! ReelForge HTTP server: wiring, routes and observability.

pub mod api;
pub mod metrics;
pub mod state;
