//! API data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::{ParameterMode, PipelineConfig, TranscriptMode};
use crate::progress::{PipelineJob, RunStatus};

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Body of `POST /api/jobs`
#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub creator_name: String,
    /// Raw listing document
    pub document: Value,
    #[serde(default)]
    pub videos_to_process: Option<usize>,
    #[serde(default)]
    pub batch_size: Option<usize>,
    #[serde(default)]
    pub enhanced: Option<bool>,
    #[serde(default)]
    pub manual: Option<bool>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub max_char: Option<u32>,
    #[serde(default)]
    pub style: Option<String>,
}

impl CreateJobRequest {
    /// Overlay the request's overrides on the server defaults
    pub fn pipeline_config(&self, defaults: &PipelineConfig) -> PipelineConfig {
        let mut config = defaults.clone();
        if self.videos_to_process.is_some() {
            config.videos_to_process = self.videos_to_process;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(enhanced) = self.enhanced {
            config.transcript_mode = if enhanced {
                TranscriptMode::Enhanced
            } else {
                TranscriptMode::Plain
            };
        }
        if let Some(manual) = self.manual {
            config.parameter_mode = if manual {
                ParameterMode::Manual
            } else {
                ParameterMode::Auto
            };
        }
        if let Some(language) = &self.language {
            config.language = language.clone();
        }
        if let Some(max_char) = self.max_char {
            config.max_char = max_char;
        }
        if let Some(style) = &self.style {
            config.style = style.clone();
        }
        config
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateJobResponse {
    pub job_id: String,
}

/// One row of `GET /api/jobs`
#[derive(Debug, Serialize, Deserialize)]
pub struct JobListEntry {
    pub job_id: String,
    pub creator_name: String,
    pub status: RunStatus,
    pub progress: u8,
    pub current_phase: String,
    pub created_at: DateTime<Utc>,
}

impl From<&PipelineJob> for JobListEntry {
    fn from(job: &PipelineJob) -> Self {
        Self {
            job_id: job.job_id.clone(),
            creator_name: job.creator_name.clone(),
            status: job.status,
            progress: job.progress,
            current_phase: job.current_phase.clone(),
            created_at: job.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_overrides() {
        let request: CreateJobRequest = serde_json::from_value(serde_json::json!({
            "creator_name": "chef",
            "document": {"itemList": []},
            "enhanced": true,
            "max_char": 80
        }))
        .unwrap();

        let config = request.pipeline_config(&PipelineConfig::default());
        assert_eq!(config.transcript_mode, TranscriptMode::Enhanced);
        assert_eq!(config.max_char, 80);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.language, "English");
    }
}
