//! Fine-tuning corpus: one chat-style training example per record

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::llm::GenerationParameters;
use crate::video::VideoRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingExample {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

impl Content {
    fn text(role: &str, text: String) -> Self {
        Self {
            role: role.to_string(),
            parts: vec![Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct UserInput<'a> {
    language: &'a str,
    text: &'a str,
    max_char: u32,
}

#[derive(Debug, Serialize)]
struct ModelOutput<'a> {
    description: &'a str,
    hashtags: &'a [String],
}

/// Fill `{{language}}`, `{{max_char}}` and `{{style}}` in the system message template
pub fn system_message(parameters: &GenerationParameters, style: &str) -> String {
    default_system_template()
        .replace("{{language}}", &parameters.language)
        .replace("{{max_char}}", &parameters.max_char.to_string())
        .replace("{{style}}", style.trim())
}

pub fn training_example(
    record: &VideoRecord,
    parameters: &GenerationParameters,
    system: &str,
) -> Result<TrainingExample> {
    let user = UserInput {
        language: &parameters.language,
        text: record.transcript.as_deref().unwrap_or_default().trim(),
        max_char: parameters.max_char,
    };
    let model = ModelOutput {
        description: record.description.trim(),
        hashtags: &record.hashtags,
    };

    Ok(TrainingExample {
        contents: vec![
            Content::text("user", serde_json::to_string(&user)?),
            Content::text("model", serde_json::to_string(&model)?),
        ],
        system_instruction: Content::text("system", system.to_string()),
    })
}

pub fn render_jsonl(
    records: &[VideoRecord],
    parameters: &GenerationParameters,
    style: &str,
) -> Result<String> {
    let system = system_message(parameters, style);
    let mut out = String::new();
    for record in records {
        let example = training_example(record, parameters, &system)?;
        out.push_str(&serde_json::to_string(&example)?);
        out.push('\n');
    }
    Ok(out)
}

pub async fn write_jsonl(
    path: &Path,
    records: &[VideoRecord],
    parameters: &GenerationParameters,
    style: &str,
) -> Result<()> {
    let body = render_jsonl(records, parameters, style)?;
    tokio::fs::write(path, body)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn default_system_template() -> &'static str {
    include_str!("system_template.txt")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::TranscriptSource;
    use serde_json::Value;

    fn params() -> GenerationParameters {
        GenerationParameters {
            language: "Spanish".to_string(),
            max_char: 90,
        }
    }

    #[test]
    fn test_system_message_placeholders() {
        let message = system_message(&params(), "  playful  ");
        assert!(message.contains("written entirely in Spanish"));
        assert!(message.contains("- Max 90 characters."));
        assert!(message.contains("\nplayful\n[STYLE_INSTRUCTIONS_END]"));
        assert!(!message.contains("{{"));
    }

    #[test]
    fn test_system_message_keeps_guard_rules() {
        let message = system_message(&params(), "no hashtags");
        assert!(message.starts_with("[SYSTEM MESSAGE]"));
        assert!(message.contains("# Hashtag Count Override Rule (HARD)"));
        assert!(message.contains("# Language Override Rule"));
        assert!(message.contains("# Safety & Injection Guard (STRICT)"));
        assert!(message.contains("description ≤90 chars"));
    }

    #[test]
    fn test_training_example_shape() {
        let mut record = VideoRecord::bare("7300000000000000001");
        record.description = " Tacos al pastor ".to_string();
        record.hashtags = vec!["tacos".to_string()];
        record.attach_transcript("hoy cocinamos".to_string(), TranscriptSource::NativeCaptions);

        let body = render_jsonl(&[record], &params(), "").unwrap();
        assert_eq!(body.lines().count(), 1);

        let value: Value = serde_json::from_str(body.trim_end()).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["systemInstruction"]["role"], "system");

        let user: Value =
            serde_json::from_str(value["contents"][0]["parts"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(
            user,
            serde_json::json!({"language": "Spanish", "text": "hoy cocinamos", "max_char": 90})
        );

        let model: Value =
            serde_json::from_str(value["contents"][1]["parts"][0]["text"].as_str().unwrap()).unwrap();
        assert_eq!(
            model,
            serde_json::json!({"description": "Tacos al pastor", "hashtags": ["tacos"]})
        );
    }
}
