use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::ProviderError;
use crate::providers::{ChatMessage, Provider};

/// OpenAI client for interacting with the chat completions API
///
/// Also works against OpenAI-compatible servers via a custom endpoint.
#[derive(Debug)]
pub struct OpenAI {
    /// HTTP client for API requests
    client: Client,
    /// API key for authentication
    api_key: String,
    /// API endpoint URL (optional, defaults to public API)
    endpoint: String,
    /// Model to request
    model: String,
    /// Sampling temperature
    temperature: f32,
}

/// OpenAI chat completion request
#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

/// OpenAI chat completion response
#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: ChatMessage,
}

impl OpenAI {
    /// Create a new OpenAI client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        temperature: f32,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
            temperature,
        }
    }

    fn api_url(&self) -> String {
        if self.endpoint.is_empty() {
            "https://api.openai.com/v1/chat/completions".to_string()
        } else {
            format!(
                "{}/chat/completions",
                self.endpoint.trim_end_matches('/')
            )
        }
    }
}

#[async_trait]
impl Provider for OpenAI {
    async fn generate(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        let mut all_messages = Vec::with_capacity(messages.len() + 1);
        all_messages.push(ChatMessage {
            role: "system".to_string(),
            content: system.to_string(),
        });
        all_messages.extend_from_slice(messages);

        let request = OpenAIRequest {
            model: &self.model,
            messages: all_messages,
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(self.api_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_status_error(status, &response_headers_reset(&response), response).await);
        }

        let parsed = response
            .json::<OpenAIResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::ParseError("response contained no choices".to_string()))
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.generate("You are a connectivity probe.", &[ChatMessage::user("Hello")])
            .await
            .map(|_| ())
    }

    fn name(&self) -> &str {
        "openai"
    }
}

/// Extract the rate-limit reset hint header, if present
fn response_headers_reset(response: &reqwest::Response) -> Option<String> {
    for header in ["retry-after", "x-ratelimit-reset-requests"] {
        if let Some(value) = response.headers().get(header) {
            if let Ok(text) = value.to_str() {
                return Some(text.to_string());
            }
        }
    }
    None
}

/// Map a transport-level reqwest error onto the provider taxonomy
pub(crate) fn classify_transport_error(error: reqwest::Error) -> ProviderError {
    if error.is_timeout() {
        ProviderError::RequestFailed(format!("request timed out: {}", error))
    } else if error.is_connect() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// Map a non-success HTTP status onto the provider taxonomy
pub(crate) async fn classify_status_error(
    status: StatusCode,
    retry_after: &Option<String>,
    response: reqwest::Response,
) -> ProviderError {
    let message = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to get error response text".to_string());

    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(message),
        429 => ProviderError::RateLimitExceeded {
            message,
            retry_after: retry_after.clone(),
        },
        code => ProviderError::ApiError {
            status_code: code,
            message,
        },
    }
}
