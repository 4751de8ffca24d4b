//! Probing questions for gathering missing student data
//!
//! Before the counselor can give grounded recommendations in an area it
//! usually needs facts it does not have yet: current courses, test scores,
//! activities. The planner asks the provider for a short list of targeted
//! questions for the active category, which the student can answer in the
//! conversation.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use kyros_providers::{CompletionProvider, Message, ProviderError, ProviderResult};

use crate::router::RouteDecision;

#[derive(Debug, Deserialize)]
struct ProbeReply {
    probes: Vec<String>,
}

/// Plans targeted data-gathering questions for a counseling category
pub struct ProbePlanner {
    provider: Arc<dyn CompletionProvider>,
    model: Option<String>,
}

impl ProbePlanner {
    /// Create a new planner. `model` overrides the provider default.
    pub fn new(provider: Arc<dyn CompletionProvider>, model: Option<String>) -> Self {
        Self { provider, model }
    }

    /// Ask for targeted questions in the given category.
    ///
    /// Unlike routing this is an explicit user action, so failures are
    /// returned to the caller instead of being degraded away.
    pub async fn probing_questions(&self, route: &RouteDecision) -> ProviderResult<Vec<String>> {
        let prompt = build_probe_prompt(route);
        let messages = vec![Message::user(prompt)];

        let completion = self
            .provider
            .generate(messages, self.model.clone(), 512, 0.0)
            .await?;

        match parse_probes(&completion.text) {
            Some(questions) => {
                debug!(
                    "Planned {} probing questions for {}",
                    questions.len(),
                    route.label()
                );
                Ok(questions)
            }
            None => Err(ProviderError::MalformedResponse(
                "probe reply did not contain a question list".to_string(),
            )),
        }
    }
}

fn build_probe_prompt(route: &RouteDecision) -> String {
    format!(
        "You are an assistant helping a college counselor gather information \
        about a student.\n\n\
        List at least four targeted questions to gather missing data necessary \
        for providing recommendations in the category of {}.\n\n\
        Respond with a JSON object only, matching this schema:\n\
        {{\"probes\": [\"<question>\", \"<question>\", ...]}}",
        route.label()
    )
}

/// Parse a probe reply, tolerating prose around the JSON object
fn parse_probes(text: &str) -> Option<Vec<String>> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    let reply: ProbeReply = serde_json::from_str(&text[start..=end]).ok()?;

    let questions: Vec<String> = reply
        .probes
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();

    if questions.is_empty() {
        None
    } else {
        Some(questions)
    }
}
