//! Profile catalog and resolution
//!
//! This module provides:
//! - The built-in compute profile catalog (CPU and A100 GPU variants)
//! - Parsing of the spawn form submitted by users
//! - Resolution of a requested slug to a session specification

mod builtin;
mod catalog;
mod form;

pub use builtin::{builtin_profiles, GPU_PRODUCT_LABEL, GPU_PRODUCT_A100, GPU_TOLERATION_KEY};
pub use catalog::{CatalogIssue, ProfileCatalog, GPU_ENVIRONMENT};
pub use form::{options_from_form, FormData, UserOptions, DEFAULT_PROFILE_SLUG};
