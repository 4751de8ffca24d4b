//! Counselor logic for kyros
//!
//! This crate provides the conversation loop, prompt context building
//! with sliding-window truncation, category routing, and probing-question
//! planning for data gathering.

pub mod context;
pub mod counselor_loop;
pub mod probe;
pub mod router;

pub use context::ContextBuilder;
pub use counselor_loop::Counselor;
pub use probe::ProbePlanner;
pub use router::{CategoryRouter, RouteDecision};
