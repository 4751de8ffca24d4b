//! Counselor loop: the core conversation engine

use std::sync::Arc;

use tracing::{debug, info};

use kyros_core::config::Config;
use kyros_core::session::Session;
use kyros_providers::{CompletionProvider, ProviderResult};

use crate::context::ContextBuilder;
use crate::probe::ProbePlanner;
use crate::router::{CategoryRouter, RouteDecision};

/// The counselor owns one session and drives provider calls for it.
///
/// One request is in flight at a time; dropping an in-flight
/// `submit_user_message` future leaves the transcript with the user turn
/// appended and no assistant turn, so the session stays usable for retry.
pub struct Counselor {
    provider: Arc<dyn CompletionProvider>,
    context: ContextBuilder,
    router: Option<CategoryRouter>,
    prober: ProbePlanner,
    session: Session,
    last_route: Option<RouteDecision>,
    model: String,
    max_tokens: u32,
    temperature: f64,
}

impl Counselor {
    /// Create a counselor with a fresh session seeded from the configured persona
    pub fn new(provider: Arc<dyn CompletionProvider>, config: &Config) -> Self {
        let router = if config.routing.enabled {
            Some(CategoryRouter::new(
                provider.clone(),
                config.routing.model.clone(),
            ))
        } else {
            None
        };

        let prober = ProbePlanner::new(provider.clone(), config.routing.model.clone());

        let session = Session::new(&config.counselor.persona);
        info!("Started counselor session {}", session.id);

        Self {
            provider,
            context: ContextBuilder::new(config.context.max_prompt_chars),
            router,
            prober,
            session,
            last_route: None,
            model: config.counselor.model.clone(),
            max_tokens: config.counselor.max_tokens,
            temperature: config.counselor.temperature,
        }
    }

    /// Submit a user turn and return the assistant's reply.
    ///
    /// The user turn is appended before the provider call; on any provider
    /// error it stays in the transcript and no assistant turn is appended,
    /// so the same message can be resubmitted or rephrased.
    pub async fn submit_user_message(&mut self, text: &str) -> ProviderResult<String> {
        self.session.push_user(text);

        let route = match &self.router {
            Some(router) => Some(router.route(text).await),
            None => None,
        };
        if route.is_some() {
            self.last_route = route.clone();
        }

        let messages = self.context.build_messages(&self.session, route.as_ref());
        debug!(
            "Submitting {} messages for session {}",
            messages.len(),
            self.session.id
        );

        let completion = self
            .provider
            .generate(
                messages,
                Some(self.model.clone()),
                self.max_tokens,
                self.temperature,
            )
            .await?;

        self.session.push_assistant(&completion.text);
        Ok(completion.text)
    }

    /// Targeted questions to gather data for the active counseling area.
    ///
    /// Uses the category of the most recently routed user message, or the
    /// default category when nothing has been routed yet.
    pub async fn probing_questions(&self) -> ProviderResult<Vec<String>> {
        let route = self
            .last_route
            .clone()
            .unwrap_or_else(RouteDecision::default_route);
        self.prober.probing_questions(&route).await
    }

    /// Discard everything except the persona turn
    pub fn reset(&mut self) {
        info!("Resetting counselor session {}", self.session.id);
        self.session.reset();
        self.last_route = None;
    }

    /// The owned session transcript
    pub fn session(&self) -> &Session {
        &self.session
    }
}
