//! OpenAI-compatible chat completions client

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use crate::base::{
    Completion, CompletionProvider, Message, ProviderError, ProviderResult, Usage,
};
use async_trait::async_trait;

/// Chat completions request format
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f64,
}

/// Chat completions response format
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: i64,
    #[serde(default)]
    completion_tokens: i64,
    #[serde(default)]
    total_tokens: i64,
}

/// Client for any OpenAI-compatible chat completions endpoint
pub struct OpenAiClient {
    client: Client,
    api_base: String,
    api_key: String,
    default_model: String,
    extra_headers: HashMap<String, String>,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(
        api_key: impl Into<String>,
        api_base: impl Into<String>,
        default_model: impl Into<String>,
        timeout_secs: u64,
        extra_headers: Option<HashMap<String, String>>,
    ) -> ProviderResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::Config(e.to_string()))?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            default_model: default_model.into(),
            extra_headers: extra_headers.unwrap_or_default(),
        })
    }

    fn apply_headers(&self, mut req_builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        req_builder = req_builder.header("Authorization", format!("Bearer {}", self.api_key));
        for (key, value) in &self.extra_headers {
            req_builder = req_builder.header(key, value);
        }
        req_builder
    }

    fn parse_completion(&self, response: ChatCompletionResponse) -> ProviderResult<Completion> {
        let choice = response.choices.first().ok_or_else(|| {
            ProviderError::MalformedResponse("no choices in response".to_string())
        })?;

        let text = choice
            .message
            .content
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| {
                ProviderError::MalformedResponse("empty completion content".to_string())
            })?;

        Ok(Completion {
            text,
            finish_reason: choice
                .finish_reason
                .clone()
                .unwrap_or_else(|| "stop".to_string()),
            usage: Usage {
                prompt_tokens: response.usage.prompt_tokens,
                completion_tokens: response.usage.completion_tokens,
                total_tokens: response.usage.total_tokens,
            },
        })
    }
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Transport(format!("request timed out: {}", err))
    } else if err.is_decode() {
        ProviderError::MalformedResponse(err.to_string())
    } else {
        ProviderError::Transport(err.to_string())
    }
}

fn map_status_error(status: StatusCode, retry_after: Option<u64>, body: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::Auth(format!("HTTP {}: {}", status, body))
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimit { retry_after },
        _ => ProviderError::Api(format!("HTTP {}: {}", status, body)),
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    async fn generate(
        &self,
        messages: Vec<Message>,
        model: Option<String>,
        max_tokens: u32,
        temperature: f64,
    ) -> ProviderResult<Completion> {
        let model = model.unwrap_or_else(|| self.default_model.clone());
        let request = ChatCompletionRequest {
            model: model.clone(),
            messages,
            max_tokens,
            temperature,
        };

        debug!(
            "Sending chat request to {} with model {}",
            self.api_base, model
        );

        let url = format!("{}/chat/completions", self.api_base);
        let req_builder = self.apply_headers(self.client.post(&url).json(&request));

        let response = req_builder.send().await.map_err(map_transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(map_status_error(status, retry_after, body));
        }

        let response_data: ChatCompletionResponse =
            response.json().await.map_err(map_transport_error)?;
        self.parse_completion(response_data)
    }

    fn default_model(&self) -> String {
        self.default_model.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(server: &mockito::ServerGuard) -> OpenAiClient {
        OpenAiClient::new("sk-test", server.url(), "gpt-4o-mini", 5, None).unwrap()
    }

    fn user_message() -> Vec<Message> {
        vec![Message::user("What GPA do I need for State U?")]
    }

    #[tokio::test]
    async fn test_generate_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(
                r#"{
                    "choices": [{
                        "message": {"content": "Most admits report a 3.5+ GPA."},
                        "finish_reason": "stop"
                    }],
                    "usage": {"prompt_tokens": 20, "completion_tokens": 9, "total_tokens": 29}
                }"#,
            )
            .create_async()
            .await;

        let client = client_for(&server);
        let completion = client
            .generate(user_message(), None, 256, 0.7)
            .await
            .unwrap();

        assert_eq!(completion.text, "Most admits report a 3.5+ GPA.");
        assert_eq!(completion.finish_reason, "stop");
        assert_eq!(completion.usage.total_tokens, 29);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_generate_maps_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(r#"{"error": "invalid api key"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .generate(user_message(), None, 256, 0.7)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Auth(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_generate_maps_rate_limit_with_retry_after() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_header("retry-after", "30")
            .with_body("slow down")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .generate(user_message(), None, 256, 0.7)
            .await
            .unwrap_err();

        match err {
            ProviderError::RateLimit { retry_after } => assert_eq!(retry_after, Some(30)),
            other => panic!("expected RateLimit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_maps_server_error_to_api() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .generate(user_message(), None, 256, 0.7)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Api(_)));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_choices() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .generate(user_message(), None, 256, 0.7)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_rejects_invalid_json_body() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let client = client_for(&server);
        let err = client
            .generate(user_message(), None, 256, 0.7)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::MalformedResponse(_)));
    }

    #[test]
    fn test_api_base_trailing_slash_is_trimmed() {
        let client =
            OpenAiClient::new("sk", "https://api.openai.com/v1/", "gpt-4o-mini", 5, None).unwrap();
        assert_eq!(client.api_base, "https://api.openai.com/v1");
    }
}
