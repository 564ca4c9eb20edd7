/*!
 * Provider-call retry orchestration.
 *
 * This module wraps a single provider call with single-flight serialization
 * and classified retries. The permit is an explicitly owned semaphore passed
 * in by the caller so at most one provider call is in flight process-wide,
 * trading throughput for provider-quota safety.
 */

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::Semaphore;

use crate::errors::{GenerationError, ProviderError};

/// Safety margin added on top of a provider-supplied reset hint
const RESET_HINT_BUFFER: Duration = Duration::from_millis(100);

/// How a failed attempt should be handled
#[derive(Debug, PartialEq)]
enum RetryClass {
    /// Rate limited; wait for the provider's reset hint when parseable
    RateLimited(Option<Duration>),
    /// Transient server or connectivity failure; exponential backoff
    Retryable,
    /// Propagate immediately without consuming an attempt
    Fatal,
}

/// Serializes and retries provider calls
pub struct RetryOrchestrator {
    /// Single-flight permit shared across every orchestrator in the process
    permit: Arc<Semaphore>,
    /// Maximum number of attempts per call
    max_attempts: u32,
    /// Base delay for exponential backoff
    base_delay: Duration,
}

impl RetryOrchestrator {
    pub fn new(permit: Arc<Semaphore>, max_attempts: u32, base_delay: Duration) -> Self {
        RetryOrchestrator {
            permit,
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Build a fresh single-call permit for callers that do not share one
    pub fn single_flight_permit() -> Arc<Semaphore> {
        Arc::new(Semaphore::new(1))
    }

    /// Execute `operation`, retrying transient failures
    ///
    /// The permit is held for the whole attempt sequence, including backoff
    /// waits, so interleaving calls cannot sneak between retries. Fatal
    /// errors propagate immediately; exhausting every attempt yields
    /// `RetriesExhausted` carrying the final error's message.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T, GenerationError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        // Closed semaphores are never used here, so acquire cannot fail
        let _guard = self
            .permit
            .acquire()
            .await
            .map_err(|e| GenerationError::Provider(ProviderError::RequestFailed(e.to_string())))?;

        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..self.max_attempts {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    let wait = match classify(&error) {
                        RetryClass::RateLimited(hint) => {
                            let wait = hint.unwrap_or_else(|| self.backoff_delay(attempt));
                            debug!(
                                "Rate limited on attempt {}/{}, waiting {:?}",
                                attempt + 1,
                                self.max_attempts,
                                wait
                            );
                            wait
                        }
                        RetryClass::Retryable => {
                            let wait = self.backoff_delay(attempt);
                            warn!(
                                "Provider call failed on attempt {}/{}: {} (retrying in {:?})",
                                attempt + 1,
                                self.max_attempts,
                                error,
                                wait
                            );
                            wait
                        }
                        RetryClass::Fatal => return Err(GenerationError::Provider(error)),
                    };

                    last_error = Some(error);
                    if attempt + 1 < self.max_attempts {
                        tokio::time::sleep(wait).await;
                    }
                }
            }
        }

        Err(GenerationError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown provider error".to_string()),
        })
    }

    fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Classify an error per the retry policy
///
/// 429 is retryable with the provider's reset hint; 5xx, timeouts and
/// connection failures are retryable with exponential backoff; everything
/// else is fatal.
fn classify(error: &ProviderError) -> RetryClass {
    match error {
        ProviderError::RateLimitExceeded { retry_after, .. } => {
            RetryClass::RateLimited(retry_after.as_deref().and_then(parse_reset_hint))
        }
        ProviderError::ApiError { status_code, .. } => match status_code {
            429 => RetryClass::RateLimited(None),
            500.. => RetryClass::Retryable,
            _ => RetryClass::Fatal,
        },
        ProviderError::ConnectionError(_) => RetryClass::Retryable,
        ProviderError::RequestFailed(message) => {
            let lowered = message.to_lowercase();
            if lowered.contains("timeout")
                || lowered.contains("timed out")
                || lowered.contains("connection")
            {
                RetryClass::Retryable
            } else {
                RetryClass::Fatal
            }
        }
        _ => RetryClass::Fatal,
    }
}

/// Parse a provider reset hint such as "2.5s", "1500ms" or a bare number of
/// seconds, adding a small fixed buffer
pub fn parse_reset_hint(hint: &str) -> Option<Duration> {
    let trimmed = hint.trim();

    let (digits, millis) = if let Some(stripped) = trimmed.strip_suffix("ms") {
        (stripped, true)
    } else if let Some(stripped) = trimmed.strip_suffix('s') {
        (stripped, false)
    } else {
        (trimmed, false)
    };

    let value: f64 = digits.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }

    let base = if millis {
        Duration::from_secs_f64(value / 1000.0)
    } else {
        Duration::from_secs_f64(value)
    };
    Some(base + RESET_HINT_BUFFER)
}
