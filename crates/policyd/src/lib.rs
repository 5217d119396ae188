//! Policy hook service for the notebook hub
//!
//! Serves profile resolution and culling decisions to the spawner and idle
//! culler integrations, plus health and metrics endpoints.

pub mod api;

pub use api::{create_router, serve, AppState};
