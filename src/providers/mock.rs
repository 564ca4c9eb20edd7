/*!
 * Mock provider implementation for testing.
 *
 * The mock replays a scripted sequence of outcomes, one per call, so tests
 * can drive the retry orchestrator and the assembler through success,
 * rate-limit, server-error and fatal paths deterministically.
 */

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::errors::ProviderError;
use crate::providers::{ChatMessage, Provider};

/// One scripted outcome for a mock call
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Succeed with this raw response text
    Reply(String),
    /// Fail with a 429, optionally carrying a reset hint
    RateLimited { retry_after: Option<String> },
    /// Fail with the given HTTP status
    ApiError(u16),
    /// Fail with a connection error
    ConnectionError,
    /// Fail with a request timeout
    Timeout,
    /// Fail with an authentication error (never retried)
    AuthError,
}

/// Mock provider replaying scripted outcomes
#[derive(Debug)]
pub struct MockProvider {
    /// Remaining scripted steps, consumed front to back
    steps: Mutex<VecDeque<MockStep>>,
    /// Response used once the script is exhausted
    fallback: Option<String>,
    /// Number of `generate` calls observed
    call_count: Arc<AtomicUsize>,
}

impl MockProvider {
    /// Create a mock that replays `steps`, then falls back to errors
    pub fn scripted(steps: Vec<MockStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: None,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that always succeeds with the same response
    pub fn returning(response: impl Into<String>) -> Self {
        Self {
            steps: Mutex::new(VecDeque::new()),
            fallback: Some(response.into()),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock that always fails with a non-retryable error
    pub fn failing() -> Self {
        Self::scripted(vec![])
    }

    /// Use `fallback` once the scripted steps run out
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// Shared counter of observed calls
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        self.call_count.clone()
    }

    pub fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn generate(
        &self,
        _system: &str,
        _messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let step = self.steps.lock().pop_front();
        match step {
            Some(MockStep::Reply(text)) => Ok(text),
            Some(MockStep::RateLimited { retry_after }) => Err(ProviderError::RateLimitExceeded {
                message: "simulated rate limit".to_string(),
                retry_after,
            }),
            Some(MockStep::ApiError(status_code)) => Err(ProviderError::ApiError {
                status_code,
                message: "simulated API error".to_string(),
            }),
            Some(MockStep::ConnectionError) => Err(ProviderError::ConnectionError(
                "simulated connection refused".to_string(),
            )),
            Some(MockStep::Timeout) => Err(ProviderError::RequestFailed(
                "simulated request timed out".to_string(),
            )),
            Some(MockStep::AuthError) => Err(ProviderError::AuthenticationError(
                "simulated invalid API key".to_string(),
            )),
            None => match &self.fallback {
                Some(text) => Ok(text.clone()),
                None => Err(ProviderError::AuthenticationError(
                    "mock script exhausted".to_string(),
                )),
            },
        }
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
