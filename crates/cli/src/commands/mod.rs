//! CLI command implementations

pub mod auth;
pub mod culler;
pub mod profiles;
pub mod render;
pub mod status;
