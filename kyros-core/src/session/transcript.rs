//! Session and turn data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who produced a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    /// Wire-format role name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in a conversation. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Turn role
    pub role: Role,
    /// Turn text
    pub text: String,
    /// Position within the session, strictly increasing with no gaps
    pub sequence_number: u64,
    /// Creation time
    pub timestamp: DateTime<Utc>,
}

/// A conversation session
///
/// Created with a single system turn carrying the counselor persona.
/// Turns are only ever appended; `reset` drops everything except the
/// persona turn and restarts numbering after it.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque session id
    pub id: Uuid,
    /// Session creation time
    pub created_at: DateTime<Utc>,
    turns: Vec<Turn>,
    next_seq: u64,
}

impl Session {
    /// Create a new session seeded with the persona system turn
    pub fn new(persona: impl Into<String>) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            turns: Vec::new(),
            next_seq: 0,
        };
        session.push(Role::System, persona);
        session
    }

    fn push(&mut self, role: Role, text: impl Into<String>) -> &Turn {
        let turn = Turn {
            role,
            text: text.into(),
            sequence_number: self.next_seq,
            timestamp: Utc::now(),
        };
        self.next_seq += 1;
        self.turns.push(turn);
        self.turns.last().expect("turn just pushed")
    }

    /// Append a user turn
    pub fn push_user(&mut self, text: impl Into<String>) -> &Turn {
        self.push(Role::User, text)
    }

    /// Append an assistant turn
    pub fn push_assistant(&mut self, text: impl Into<String>) -> &Turn {
        self.push(Role::Assistant, text)
    }

    /// Discard all turns except the initial persona turn. Idempotent.
    pub fn reset(&mut self) {
        self.turns.truncate(1);
        self.next_seq = 1;
    }

    /// All turns in sequence order
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns, persona included
    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    /// The most recent user turn, if any
    pub fn last_user_turn(&self) -> Option<&Turn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }

    /// The persona system turn
    pub fn persona_turn(&self) -> &Turn {
        &self.turns[0]
    }
}
