pub mod advisor;
pub mod providers;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use advisor::{GenerationParameters, ParameterAdvisor};

/// LLM provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LLMProvider {
    LMStudio,
    Gemini,
    OpenAI,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LLMConfig {
    /// Consult the model for generation parameters in auto mode
    pub enabled: bool,
    pub provider: LLMProvider,
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_seconds: u64,
    /// Number of processed records shown to the model
    pub sample_size: usize,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: LLMProvider::LMStudio,
            endpoint: Some("http://localhost:1234/v1/chat/completions".to_string()),
            api_key: None,
            model: "local-model".to_string(),
            max_tokens: 512,
            temperature: 0.1,
            timeout_seconds: 60,
            sample_size: 5,
        }
    }
}

/// Chat message for LLM communication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// LLM response
#[derive(Debug, Clone)]
pub struct LLMResponse {
    pub content: String,
    pub tokens_used: Option<u32>,
}

/// Trait for LLM providers
#[async_trait]
pub trait LLM: Send + Sync {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse>;
    fn provider_type(&self) -> LLMProvider;
}

/// Create LLM instance based on configuration
pub fn create_llm(config: &LLMConfig) -> Result<Box<dyn LLM>> {
    match config.provider {
        LLMProvider::LMStudio | LLMProvider::OpenAI => Ok(Box::new(
            providers::ChatCompletionsProvider::new(config.clone())?,
        )),
        LLMProvider::Gemini => Ok(Box::new(providers::GeminiProvider::new(config.clone())?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_llm_factory() {
        let config = LLMConfig::default();
        let llm = create_llm(&config).unwrap();
        assert_eq!(llm.provider_type(), LLMProvider::LMStudio);
    }

    #[test]
    fn test_cloud_providers_need_keys() {
        let config = LLMConfig {
            provider: LLMProvider::Gemini,
            api_key: None,
            ..LLMConfig::default()
        };
        assert!(create_llm(&config).is_err());

        let config = LLMConfig {
            provider: LLMProvider::OpenAI,
            api_key: None,
            ..LLMConfig::default()
        };
        assert!(create_llm(&config).is_err());
    }
}
