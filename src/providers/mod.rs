/*!
 * Provider implementations for generative-text services.
 *
 * This module contains client implementations for the supported LLM
 * providers:
 * - OpenAI: OpenAI API integration (and OpenAI-compatible servers)
 * - Anthropic: Anthropic API integration
 * - Mock: scripted provider for tests
 *
 * Clients do not retry; they classify failures into `ProviderError` variants
 * and leave retry policy to the orchestrator.
 */

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::errors::ProviderError;

/// One message in a provider conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender (user, assistant)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        ChatMessage {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Common trait for all generative-text providers
///
/// Object-safe so the assembler can hold any provider behind `Arc<dyn
/// Provider>`; implementations return the raw response text and surface
/// failures as classified `ProviderError`s.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// Complete a conversation and return the raw response text
    async fn generate(
        &self,
        system: &str,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Provider name for logging
    fn name(&self) -> &str;
}

pub mod anthropic;
pub mod mock;
pub mod openai;
