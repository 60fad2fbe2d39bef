//! Model invocation: send a prompt, get text back.
//!
//! The pipeline talks to the model through [`ModelClient`]. The production
//! implementation, [`LlmModelClient`], wraps any `edgequake_llm` provider;
//! tests and embedders can plug in their own.
//!
//! Exactly one attempt is made per call. A failed generation is surfaced to
//! the user, who decides whether to trigger it again.

use crate::config::GenerationConfig;
use crate::error::StudyError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Prompt in, free-form text out.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send `prompt` and return the raw response text.
    ///
    /// Any transport or provider failure is a [`StudyError::Provider`].
    async fn complete(&self, prompt: &str) -> Result<String, StudyError>;
}

/// [`ModelClient`] backed by an `edgequake_llm` provider.
#[derive(Clone)]
pub struct LlmModelClient {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    api_timeout: Option<Duration>,
}

impl LlmModelClient {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &GenerationConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            api_timeout: config.api_timeout_secs.map(Duration::from_secs),
        }
    }
}

#[async_trait]
impl ModelClient for LlmModelClient {
    async fn complete(&self, prompt: &str) -> Result<String, StudyError> {
        let start = Instant::now();
        let messages = vec![ChatMessage::user(prompt)];
        let call = self.provider.chat(&messages, Some(&self.options));

        let result = match self.api_timeout {
            Some(limit) => timeout(limit, call).await.map_err(|_| {
                warn!("Model call timed out after {}s", limit.as_secs());
                StudyError::provider(format!("timed out after {}s", limit.as_secs()))
            })?,
            None => call.await,
        };

        match result {
            Ok(response) => {
                debug!(
                    "{} input tokens, {} output tokens, {:?}",
                    response.prompt_tokens,
                    response.completion_tokens,
                    start.elapsed()
                );
                Ok(response.content)
            }
            Err(e) => {
                warn!("Model call failed: {}", e);
                Err(StudyError::provider(e.to_string()))
            }
        }
    }
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = GenerationConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(2048));
    }

    #[test]
    fn build_options_follow_builder() {
        let config = GenerationConfig::builder()
            .temperature(0.7)
            .max_tokens(512)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(512));
    }
}
