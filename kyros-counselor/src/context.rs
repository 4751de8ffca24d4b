//! Context builder for assembling prompts

use kyros_core::session::{Role, Session};
use kyros_providers::Message;

use crate::router::RouteDecision;

/// Builds the message list sent to the provider for each request
pub struct ContextBuilder {
    max_prompt_chars: usize,
}

impl ContextBuilder {
    /// Create a new context builder with a character budget for the
    /// serialized transcript
    pub fn new(max_prompt_chars: usize) -> Self {
        Self { max_prompt_chars }
    }

    /// Build the outgoing system prompt from the session's persona turn
    pub fn build_system_prompt(&self, session: &Session, route: Option<&RouteDecision>) -> String {
        let now = chrono::Local::now().format("%Y-%m-%d (%A)");
        let mut prompt = format!("{}\n\n## Current Date\n{}", session.persona_turn().text, now);

        if let Some(decision) = route {
            prompt.push_str(&format!(
                "\n\n## Guidance Area\nThe student's question falls under: {}",
                decision.label()
            ));
        }

        prompt
    }

    /// Build the complete message list for a provider call.
    ///
    /// The transcript is included in sequence order. When the character
    /// budget would be exceeded, the oldest non-system turns are dropped
    /// first; the persona turn and the most recent turn are always kept.
    pub fn build_messages(&self, session: &Session, route: Option<&RouteDecision>) -> Vec<Message> {
        let system_prompt = self.build_system_prompt(session, route);
        let budget = self.max_prompt_chars.saturating_sub(system_prompt.len());

        let history: Vec<_> = session
            .turns()
            .iter()
            .filter(|t| t.role != Role::System)
            .collect();

        let mut kept = Vec::new();
        let mut used = 0usize;
        for turn in history.iter().rev() {
            let cost = turn.text.len();
            if kept.is_empty() || used + cost <= budget {
                used += cost;
                kept.push(*turn);
            } else {
                break;
            }
        }
        kept.reverse();

        let mut messages = vec![Message::system(system_prompt)];
        messages.extend(kept.into_iter().map(Message::from));
        messages
    }
}
