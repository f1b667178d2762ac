use super::{ChatMessage, LLMConfig, LLMProvider, LLMResponse, LLM};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI-style `/chat/completions` provider, used for both LMStudio and OpenAI
pub struct ChatCompletionsProvider {
    config: LLMConfig,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    usage: Option<CompletionUsage>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionUsage {
    total_tokens: u32,
}

impl ChatCompletionsProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        let endpoint = match config.provider {
            LLMProvider::OpenAI => {
                if config.api_key.is_none() {
                    return Err(anyhow!("OpenAI API key required"));
                }
                config
                    .endpoint
                    .clone()
                    .filter(|ep| !ep.contains("localhost"))
                    .unwrap_or_else(|| OPENAI_CHAT_URL.to_string())
            }
            _ => config
                .endpoint
                .clone()
                .ok_or_else(|| anyhow!("LMStudio endpoint not configured"))?,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            config,
            endpoint,
            client,
        })
    }
}

#[async_trait]
impl LLM for ChatCompletionsProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse> {
        let request = CompletionRequest {
            model: &self.config.model,
            messages: &messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!("Sending chat request to {}", self.endpoint);

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }
        let response = builder.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("{:?} API error {}: {}", self.config.provider, status, text));
        }

        let body: CompletionResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No response from {:?}", self.config.provider))?
            .message
            .content;

        Ok(LLMResponse {
            content,
            tokens_used: body.usage.map(|u| u.total_tokens),
        })
    }

    fn provider_type(&self) -> LLMProvider {
        self.config.provider
    }
}

/// Gemini provider implementation
pub struct GeminiProvider {
    config: LLMConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Vec<GeminiCandidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiUsage {
    #[serde(rename = "totalTokenCount")]
    total_token_count: u32,
}

impl GeminiProvider {
    pub fn new(config: LLMConfig) -> Result<Self> {
        if config.api_key.is_none() {
            return Err(anyhow!("Gemini API key required"));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl LLM for GeminiProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<LLMResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| anyhow!("Gemini API key not configured"))?;

        // Gemini takes a single flattened prompt here
        let content = messages
            .iter()
            .map(|msg| format!("{}: {}", msg.role, msg.content))
            .collect::<Vec<_>>()
            .join("\n");

        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: content }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
            },
        };

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.config.model
        );

        debug!("Sending request to Gemini API");

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Gemini API error {}: {}", status, text));
        }

        let gemini_response: GeminiResponse = response.json().await?;

        let content = gemini_response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| anyhow!("No response from Gemini"))?;

        Ok(LLMResponse {
            content,
            tokens_used: gemini_response.usage_metadata.map(|u| u.total_token_count),
        })
    }

    fn provider_type(&self) -> LLMProvider {
        LLMProvider::Gemini
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_defaults_to_public_endpoint() {
        let config = LLMConfig {
            provider: LLMProvider::OpenAI,
            api_key: Some("sk-test".to_string()),
            ..LLMConfig::default()
        };
        let provider = ChatCompletionsProvider::new(config).unwrap();
        assert_eq!(provider.endpoint, OPENAI_CHAT_URL);
        assert_eq!(provider.provider_type(), LLMProvider::OpenAI);
    }

    #[test]
    fn test_lmstudio_requires_endpoint() {
        let config = LLMConfig {
            endpoint: None,
            ..LLMConfig::default()
        };
        assert!(ChatCompletionsProvider::new(config).is_err());
    }
}
