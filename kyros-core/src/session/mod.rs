//! Conversation session model
//!
//! A session owns the ordered transcript of turns for one continuous
//! conversation. Transcripts live in memory for the process lifetime only.

pub mod transcript;

pub use transcript::{Role, Session, Turn};
