//! Suggests training-example parameters from a sample of processed videos

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ChatMessage, LLM};
use crate::config::PipelineConfig;
use crate::video::VideoRecord;

/// Longest description the target platform accepts
const MAX_DESCRIPTION_CHARS: u32 = 2200;

/// Transcript excerpt length shown to the model per sample
const SAMPLE_TRANSCRIPT_CHARS: usize = 400;

/// Language and description length written into training examples
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub language: String,
    pub max_char: u32,
}

impl GenerationParameters {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            language: config.language.clone(),
            max_char: config.max_char,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    language: Option<String>,
    max_char: Option<i64>,
}

/// Asks an LLM for generation parameters, falling back to the configured values
pub struct ParameterAdvisor {
    llm: Option<Arc<dyn LLM>>,
    sample_size: usize,
}

impl ParameterAdvisor {
    pub fn new(llm: Option<Arc<dyn LLM>>, sample_size: usize) -> Self {
        Self {
            llm,
            sample_size: sample_size.max(1),
        }
    }

    /// Resolve parameters for a run; never fails
    pub async fn resolve(
        &self,
        config: &PipelineConfig,
        records: &[VideoRecord],
    ) -> GenerationParameters {
        let defaults = GenerationParameters::from_config(config);

        let Some(llm) = &self.llm else {
            warn!("⚠️ No LLM configured for parameter analysis, using configured defaults");
            return defaults;
        };

        if records.is_empty() {
            debug!("No records to analyze, using configured defaults");
            return defaults;
        }

        let messages = vec![
            ChatMessage::system(advisor_prompt()),
            ChatMessage::user(self.sample_prompt(records)),
        ];

        let response = match llm.chat(messages).await {
            Ok(response) => response,
            Err(e) => {
                warn!("⚠️ Parameter analysis failed ({}), using configured defaults", e);
                return defaults;
            }
        };

        debug!(
            "Advisor responded via {:?} ({:?} tokens)",
            llm.provider_type(),
            response.tokens_used
        );

        match parse_suggestion(&response.content) {
            Some(params) => {
                info!(
                    "🧠 Suggested parameters: language={}, max_char={}",
                    params.language, params.max_char
                );
                params
            }
            None => {
                warn!(
                    "⚠️ Unusable parameter suggestion {:?}, using configured defaults",
                    response.content
                );
                defaults
            }
        }
    }

    fn sample_prompt(&self, records: &[VideoRecord]) -> String {
        let mut prompt = String::from("Analyze these videos from one creator:\n");
        for (i, record) in records.iter().take(self.sample_size).enumerate() {
            let excerpt: String = record
                .transcript
                .as_deref()
                .unwrap_or_default()
                .chars()
                .take(SAMPLE_TRANSCRIPT_CHARS)
                .collect();
            prompt.push_str(&format!(
                "\n{}. Description ({} chars): {}\n   Hashtags: {}\n   Transcript: {}\n",
                i + 1,
                record.description.chars().count(),
                record.description,
                record.hashtags.join(", "),
                excerpt
            ));
        }
        prompt
    }
}

fn advisor_prompt() -> &'static str {
    "You study short-form video captions. Given sample videos, decide which language the \
     creator writes descriptions in and a typical maximum description length in characters. \
     Respond with JSON only: {\"language\": \"<language name>\", \"max_char\": <integer>}"
}

/// Extract the JSON object between the first `{` and the last `}` and validate it
fn parse_suggestion(content: &str) -> Option<GenerationParameters> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    if end < start {
        return None;
    }

    let suggestion: Suggestion = serde_json::from_str(&content[start..=end]).ok()?;
    let language = suggestion.language?.trim().to_string();
    let max_char = suggestion.max_char?;

    if language.is_empty() || max_char < 1 || max_char > i64::from(MAX_DESCRIPTION_CHARS) {
        return None;
    }

    Some(GenerationParameters {
        language,
        max_char: max_char as u32,
    })
}
