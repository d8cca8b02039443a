//! LLM content generation.
//!
//! Submits cleaned text to the configured model and returns the generated
//! script, bounded by `max_output_tokens`. A completion cut off by the
//! token cap is treated as a failure rather than returned partially; there
//! is no internal retry.

use crate::cleaner::CleanedContent;
use crate::config::ContentGeneratorSettings;
use crate::error::{KastError, Result};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs, FinishReason,
};
use async_openai::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Timeout for LLM API requests (5 minutes).
const API_TIMEOUT_SECS: u64 = 300;

const GENERATE_SYSTEM: &str =
    "You are a podcast script writer. Turn the provided source material into \
     an engaging script for a two-host conversation, staying faithful to the \
     source.";

const SUMMARIZE_SYSTEM: &str =
    "Summarize the provided source material into a few short paragraphs, \
     keeping the key facts and names.";

/// Generation parameters, read-only after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model_name: String,
    pub meta_model_name: String,
    pub max_output_tokens: u32,
}

impl From<&ContentGeneratorSettings> for GenerationConfig {
    fn from(settings: &ContentGeneratorSettings) -> Self {
        Self {
            model_name: settings.llm_model.clone(),
            meta_model_name: settings.meta_llm_model.clone(),
            max_output_tokens: settings.max_output_tokens,
        }
    }
}

/// Generated script text plus the provider-reported token count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedContent {
    pub text: String,
    pub token_count: u32,
}

/// LLM-backed content generator.
pub struct ContentGenerator {
    client: Client<OpenAIConfig>,
    config: GenerationConfig,
}

impl ContentGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        Self {
            client: create_client(Duration::from_secs(API_TIMEOUT_SECS)),
            config,
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Generate a script from cleaned content using the primary model.
    #[instrument(skip(self, content))]
    pub async fn generate(&self, content: &CleanedContent) -> Result<GeneratedContent> {
        info!(
            model = %self.config.model_name,
            max_output_tokens = self.config.max_output_tokens,
            "Generating content"
        );
        self.complete(&self.config.model_name, GENERATE_SYSTEM, &content.text)
            .await
    }

    /// Summarize text using the meta model.
    #[instrument(skip(self, text))]
    pub async fn summarize(&self, text: &str) -> Result<GeneratedContent> {
        info!(model = %self.config.meta_model_name, "Summarizing content");
        self.complete(&self.config.meta_model_name, SUMMARIZE_SYSTEM, text)
            .await
    }

    /// One chat-completion call, bounded by the configured token budget.
    async fn complete(&self, model: &str, system: &str, user: &str) -> Result<GeneratedContent> {
        let request = build_request(model, system, user, self.config.max_output_tokens)?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| KastError::OpenAI(format!("completion request failed: {}", e)))?;

        let choice = response
            .choices
            .first()
            .ok_or_else(|| KastError::Generation("provider returned no choices".to_string()))?;

        if choice.finish_reason == Some(FinishReason::Length) {
            return Err(KastError::Generation(format!(
                "output truncated at the {}-token budget; raise max_output_tokens",
                self.config.max_output_tokens
            )));
        }

        let text = choice
            .message
            .content
            .clone()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| KastError::Generation("provider returned empty content".to_string()))?;

        let token_count = response
            .usage
            .map(|u| u.completion_tokens)
            .unwrap_or_else(|| fallback_token_count(&text, self.config.max_output_tokens));
        let token_count = enforce_token_budget(token_count, self.config.max_output_tokens)?;

        debug!(token_count, "Generation complete");

        Ok(GeneratedContent { text, token_count })
    }
}

/// Create an OpenAI client with a request timeout to prevent hung calls.
fn create_client(timeout: Duration) -> Client<OpenAIConfig> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default();

    Client::with_config(OpenAIConfig::default()).with_http_client(http_client)
}

/// Build a chat-completion request with the token cap applied.
fn build_request(
    model: &str,
    system: &str,
    user: &str,
    max_output_tokens: u32,
) -> Result<CreateChatCompletionRequest> {
    let messages: Vec<ChatCompletionRequestMessage> = vec![
        ChatCompletionRequestSystemMessageArgs::default()
            .content(system)
            .build()
            .map_err(|e| KastError::Generation(e.to_string()))?
            .into(),
        ChatCompletionRequestUserMessageArgs::default()
            .content(user)
            .build()
            .map_err(|e| KastError::Generation(e.to_string()))?
            .into(),
    ];

    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .max_tokens(max_output_tokens)
        .build()
        .map_err(|e| KastError::Generation(e.to_string()))
}

/// Reject a token count above the configured budget.
fn enforce_token_budget(token_count: u32, max_output_tokens: u32) -> Result<u32> {
    if token_count > max_output_tokens {
        return Err(KastError::Generation(format!(
            "provider reported {} output tokens, above the {} budget",
            token_count, max_output_tokens
        )));
    }
    Ok(token_count)
}

/// Token count used when the provider omits usage data.
///
/// The estimate is clamped to the budget: the completion was not cut off
/// by the cap (truncation is rejected earlier), so an estimate overshoot
/// must not fail an otherwise valid response.
fn fallback_token_count(text: &str, max_output_tokens: u32) -> u32 {
    estimate_tokens(text).min(max_output_tokens)
}

/// Rough token estimate used when the provider omits usage data.
fn estimate_tokens(text: &str) -> u32 {
    // Whitespace words undercount tokens slightly; scale up.
    let words = text.split_whitespace().count() as u32;
    words + words / 3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = ContentGeneratorSettings::default();
        let config = GenerationConfig::from(&settings);
        assert_eq!(config.model_name, "gpt-4o");
        assert_eq!(config.meta_model_name, "gpt-4o-mini");
        assert_eq!(config.max_output_tokens, 8192);
    }

    #[test]
    fn test_build_request_applies_token_cap() {
        let request = build_request("gpt-4o", "sys", "user text", 8192).unwrap();
        assert_eq!(request.model, "gpt-4o");
        #[allow(deprecated)]
        {
            assert_eq!(request.max_tokens, Some(8192));
        }
        assert_eq!(request.messages.len(), 2);
    }

    #[test]
    fn test_token_budget_enforced() {
        assert_eq!(enforce_token_budget(8192, 8192).unwrap(), 8192);
        assert_eq!(enforce_token_budget(100, 8192).unwrap(), 100);
        assert!(enforce_token_budget(8193, 8192).is_err());
    }

    #[test]
    fn test_estimate_tokens_scales_with_words() {
        assert_eq!(estimate_tokens(""), 0);
        let est = estimate_tokens("one two three four five six");
        assert!(est >= 6);
    }

    #[test]
    fn test_fallback_count_never_exceeds_budget() {
        // A long, non-truncated completion: the raw estimate overshoots
        // the budget, but the fallback must still pass the budget check.
        let text = vec!["word"; 700].join(" ");
        assert!(estimate_tokens(&text) > 800);

        let count = fallback_token_count(&text, 800);
        assert_eq!(count, 800);
        assert!(enforce_token_budget(count, 800).is_ok());
    }
}
