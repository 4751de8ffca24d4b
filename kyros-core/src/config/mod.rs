//! Configuration management
//!
//! Handles loading and validation of kyros configuration from file
//! and environment variables.

pub mod loader;
pub mod schema;
pub mod validate;

pub use loader::ConfigLoader;
pub use schema::*;
