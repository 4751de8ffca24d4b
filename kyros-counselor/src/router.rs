//! Category routing for user messages
//!
//! Each user message is classified into a counseling category before the
//! counselor answers, so the system prompt can carry area-specific guidance.
//! Routing is best-effort: any failure degrades to the default category
//! rather than failing the user's turn.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use kyros_providers::{CompletionProvider, Message};

/// Counseling categories and their subcategories
pub const CATEGORIES: &[(&str, &[&str])] = &[
    ("Academics", &["Courses", "Standardized Testing", "Gap Analysis"]),
    (
        "ECA",
        &["ECA Recommendations", "Summer Programs", "Impact Metrics"],
    ),
    (
        "Personal Development",
        &["Self-Reflection", "Growth Comparisons"],
    ),
    (
        "College Applications",
        &[
            "Essay Guidance",
            "Application Tracker",
            "College List",
            "Scholarships",
        ],
    ),
];

/// Category used when classification fails or returns something unknown
pub const DEFAULT_CATEGORY: &str = "Academics";

/// Outcome of classifying a user message
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct RouteDecision {
    /// The main category selected
    pub category: String,
    /// The subcategory selected, if any
    #[serde(default)]
    pub subcategory: Option<String>,
}

impl RouteDecision {
    /// Fallback decision
    pub fn default_route() -> Self {
        Self {
            category: DEFAULT_CATEGORY.to_string(),
            subcategory: None,
        }
    }

    /// Human-readable "Category / Subcategory" label
    pub fn label(&self) -> String {
        match &self.subcategory {
            Some(sub) => format!("{} / {}", self.category, sub),
            None => self.category.clone(),
        }
    }
}

/// Classifies user messages into the category catalog via one provider call
pub struct CategoryRouter {
    provider: Arc<dyn CompletionProvider>,
    model: Option<String>,
}

impl CategoryRouter {
    /// Create a new router. `model` overrides the provider default.
    pub fn new(provider: Arc<dyn CompletionProvider>, model: Option<String>) -> Self {
        Self { provider, model }
    }

    /// Classify a user message, degrading to the default category on any failure
    pub async fn route(&self, user_message: &str) -> RouteDecision {
        let prompt = build_router_prompt(user_message);
        let messages = vec![Message::user(prompt)];

        // Low temperature: classification should be deterministic
        match self
            .provider
            .generate(messages, self.model.clone(), 256, 0.0)
            .await
        {
            Ok(completion) => match parse_decision(&completion.text) {
                Some(decision) => {
                    debug!("Routed message to {}", decision.label());
                    decision
                }
                None => {
                    warn!("Router output was not in the expected format, using default category");
                    RouteDecision::default_route()
                }
            },
            Err(e) => {
                warn!("Routing call failed, using default category: {}", e);
                RouteDecision::default_route()
            }
        }
    }
}

fn build_router_prompt(user_message: &str) -> String {
    let categories_str = CATEGORIES
        .iter()
        .map(|(cat, subs)| format!("- {}: {}", cat, subs.join(", ")))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an assistant that categorizes student messages for a college counselor.\n\n\
        Determine the appropriate category and subcategory for the student's message from the \
        following options:\n\n{}\n\n\
        Respond with a JSON object only, matching this schema:\n\
        {{\"category\": \"<category name>\", \"subcategory\": \"<subcategory name or null>\"}}\n\n\
        Student's Message: {}",
        categories_str, user_message
    )
}

/// Parse a router reply, tolerating prose around the JSON object
fn parse_decision(text: &str) -> Option<RouteDecision> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }

    let decision: RouteDecision = serde_json::from_str(&text[start..=end]).ok()?;

    // Unknown categories are treated as a parse failure
    let known = CATEGORIES
        .iter()
        .find(|(cat, _)| cat.eq_ignore_ascii_case(&decision.category))?;

    let subcategory = decision.subcategory.filter(|sub| {
        known
            .1
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(sub))
    });

    Some(RouteDecision {
        category: known.0.to_string(),
        subcategory,
    })
}
