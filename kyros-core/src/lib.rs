//! Core types for kyros
//!
//! This crate provides the error type, configuration, logging setup,
//! and the conversation session model used by all other kyros components.

pub mod config;
pub mod error;
pub mod logging;
pub mod session;

pub use error::{Error, Result};
