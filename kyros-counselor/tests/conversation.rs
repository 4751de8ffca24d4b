//! End-to-end conversation scenarios with a stubbed provider

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use kyros_core::config::Config;
use kyros_core::session::Role;
use kyros_counselor::Counselor;
use kyros_providers::{
    Completion, CompletionProvider, Message, ProviderError, ProviderResult,
};

/// Replays a script of replies and records every outgoing request
struct StubProvider {
    script: Mutex<Vec<ProviderResult<Completion>>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl StubProvider {
    fn new(script: Vec<ProviderResult<Completion>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    async fn generate(
        &self,
        messages: Vec<Message>,
        _model: Option<String>,
        _max_tokens: u32,
        _temperature: f64,
    ) -> ProviderResult<Completion> {
        self.requests.lock().unwrap().push(messages);
        self.script.lock().unwrap().remove(0)
    }

    fn default_model(&self) -> String {
        "stub".to_string()
    }
}

fn reply(text: &str) -> ProviderResult<Completion> {
    Ok(Completion {
        text: text.to_string(),
        finish_reason: "stop".to_string(),
        usage: Default::default(),
    })
}

fn config() -> Config {
    let mut config = Config::default();
    config.provider.api_key = "sk-test".to_string();
    config.routing.enabled = false;
    config
}

#[tokio::test]
async fn scenario_single_exchange() {
    let provider = StubProvider::new(vec![reply("Most admits report a 3.5+ GPA.")]);
    let mut counselor = Counselor::new(provider, &config());

    let text = counselor
        .submit_user_message("What GPA do I need for State U?")
        .await
        .unwrap();

    assert_eq!(text, "Most admits report a 3.5+ GPA.");
    let turns = counselor.session().turns();
    assert_eq!(turns.len(), 3);
    assert_eq!(turns[0].role, Role::System);
    assert_eq!(turns[1].role, Role::User);
    assert_eq!(turns[2].role, Role::Assistant);
}

#[tokio::test]
async fn scenario_rate_limit_leaves_user_turn() {
    let provider = StubProvider::new(vec![Err(ProviderError::RateLimit { retry_after: None })]);
    let mut counselor = Counselor::new(provider, &config());

    let err = counselor
        .submit_user_message("What about scholarships?")
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::RateLimit { .. }));
    let turns = counselor.session().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].role, Role::System);
    assert_eq!(turns[1].role, Role::User);
}

#[tokio::test]
async fn scenario_reset_after_exchanges() {
    let provider = StubProvider::new(vec![reply("one"), reply("two"), reply("three")]);
    let mut counselor = Counselor::new(provider, &config());

    for question in ["a?", "b?", "c?"] {
        counselor.submit_user_message(question).await.unwrap();
    }
    assert_eq!(counselor.session().turn_count(), 7);

    counselor.reset();
    assert_eq!(counselor.session().turn_count(), 1);
    assert_eq!(counselor.session().turns()[0].role, Role::System);

    // Idempotent
    counselor.reset();
    assert_eq!(counselor.session().turn_count(), 1);
}

#[tokio::test]
async fn sequence_numbers_stay_gap_free_across_exchanges() {
    let provider = StubProvider::new(vec![reply("1"), reply("2"), reply("3"), reply("4")]);
    let mut counselor = Counselor::new(provider, &config());

    for question in ["a?", "b?", "c?", "d?"] {
        counselor.submit_user_message(question).await.unwrap();
    }

    let seqs: Vec<u64> = counselor
        .session()
        .turns()
        .iter()
        .map(|t| t.sequence_number)
        .collect();
    let expected: Vec<u64> = (0..seqs.len() as u64).collect();
    assert_eq!(seqs, expected);
}

#[tokio::test]
async fn outgoing_requests_keep_persona_and_latest_user_turn_when_windowed() {
    let mut cfg = config();
    cfg.context.max_prompt_chars = 700;
    cfg.counselor.persona = "You are KYROS.".to_string();

    let script = (0..8).map(|i| reply(&format!("answer {}", i))).collect();
    let provider = StubProvider::new(script);
    let mut counselor = Counselor::new(provider.clone(), &cfg);

    for i in 0..8 {
        let question = format!("question {} {}", i, "x".repeat(120));
        counselor.submit_user_message(&question).await.unwrap();
    }

    let requests = provider.requests();
    assert_eq!(requests.len(), 8);

    // Later requests must have been truncated
    let last = requests.last().unwrap();
    assert!(last.len() < counselor.session().turn_count());

    for (i, request) in requests.iter().enumerate() {
        // Persona system message always first
        assert_eq!(request[0].role, "system");
        assert!(request[0].content.contains("You are KYROS."));
        // Most recent user turn always present
        let tail = request.last().unwrap();
        assert_eq!(tail.role, "user");
        assert!(tail.content.starts_with(&format!("question {} ", i)));
    }
}

#[tokio::test]
async fn probing_questions_target_the_routed_category() {
    let mut cfg = config();
    cfg.routing.enabled = true;

    let provider = StubProvider::new(vec![
        reply(r#"{"category": "College Applications", "subcategory": "College List"}"#),
        reply("Let's build a balanced list."),
        reply(
            r#"{"probes": ["Which regions interest you?", "What is your budget?", "Intended major?", "Any reach schools in mind?"]}"#,
        ),
    ]);
    let mut counselor = Counselor::new(provider.clone(), &cfg);

    counselor
        .submit_user_message("Help me pick colleges to apply to")
        .await
        .unwrap();
    let questions = counselor.probing_questions().await.unwrap();

    assert_eq!(questions.len(), 4);

    // Router call, answer call, then the question-planning call
    let requests = provider.requests();
    assert_eq!(requests.len(), 3);
    let probe_request = requests.last().unwrap();
    assert_eq!(probe_request.len(), 1);
    assert!(probe_request[0]
        .content
        .contains("College Applications / College List"));
}

#[tokio::test]
async fn dropped_future_does_not_append_assistant_turn() {
    // A provider that never resolves, standing in for an interrupted request
    struct HangingProvider;

    #[async_trait]
    impl CompletionProvider for HangingProvider {
        async fn generate(
            &self,
            _messages: Vec<Message>,
            _model: Option<String>,
            _max_tokens: u32,
            _temperature: f64,
        ) -> ProviderResult<Completion> {
            std::future::pending().await
        }

        fn default_model(&self) -> String {
            "stub".to_string()
        }
    }

    let mut counselor = Counselor::new(Arc::new(HangingProvider), &config());

    let result = tokio::time::timeout(
        std::time::Duration::from_millis(20),
        counselor.submit_user_message("are you there?"),
    )
    .await;
    assert!(result.is_err());

    // Only the user turn was appended; the session remains usable
    let turns = counselor.session().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].role, Role::User);
}
