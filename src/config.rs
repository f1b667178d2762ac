use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::llm::{LLMConfig, LLMProvider};

/// Configuration for the BrandVoice pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Per-run pipeline settings
    pub pipeline: PipelineConfig,

    /// Clip-processing service settings
    pub service: ServiceConfig,

    /// Parameter advisor LLM settings
    pub llm: LLMConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Records per submission batch
    pub batch_size: usize,

    /// Process only the top N videos by view count
    pub videos_to_process: Option<usize>,

    /// Whether generation parameters come from the advisor or from this config
    pub parameter_mode: ParameterMode,

    /// Transcript flattening mode
    pub transcript_mode: TranscriptMode,

    /// Language written into training examples
    pub language: String,

    /// Maximum description length written into training examples
    pub max_char: u32,

    /// Free-form style instructions injected into the training system message
    pub style: String,

    /// Try platform captions before submitting to the clip service
    pub native_captions: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterMode {
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptMode {
    /// Verbal lines only
    Plain,
    /// Verbal lines interleaved with visual context markers
    Enhanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// API base URL
    pub base_url: String,

    /// Bearer token for the service
    pub api_key: Option<String>,

    /// Curation model requested on submission
    pub curation_model: String,

    /// Timeout for a single HTTP request (seconds)
    pub request_timeout_seconds: u64,

    /// Delay between status checks (seconds)
    pub poll_interval_seconds: u64,

    /// Give up on a project after this long (seconds)
    pub poll_timeout_seconds: u64,

    /// Consecutive identical status-check errors before an item is failed
    pub max_consecutive_poll_errors: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for CSV artifacts, also scanned by the dedup gate
    pub output_dir: PathBuf,

    /// Directory for JSONL training corpora
    pub training_dir: PathBuf,

    /// Default tracing filter level
    pub log_level: String,
}

impl Config {
    /// Load configuration from file or environment
    pub fn load() -> Result<Self> {
        let mut config_paths = vec![
            PathBuf::from("brandvoice.toml"),
            PathBuf::from("config/brandvoice.toml"),
        ];
        if let Ok(home) = std::env::var("HOME") {
            config_paths.push(PathBuf::from(home).join(".config/brandvoice/config.toml"));
        }
        config_paths.push(PathBuf::from("/etc/brandvoice/config.toml"));

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path.display());
                        config.apply_env();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path.display(), e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        if let Ok(api_key) = std::env::var("OPUSCLIP_API_KEY") {
            self.service.api_key = Some(api_key);
        }

        if let Ok(dir) = std::env::var("BRANDVOICE_OUTPUT_DIR") {
            self.output.output_dir = PathBuf::from(dir);
        }

        if let Ok(dir) = std::env::var("BRANDVOICE_TRAINING_DIR") {
            self.output.training_dir = PathBuf::from(dir);
        }

        if let Ok(batch) = std::env::var("BRANDVOICE_BATCH_SIZE") {
            self.pipeline.batch_size = batch.parse().unwrap_or(self.pipeline.batch_size);
        }

        if let Ok(interval) = std::env::var("BRANDVOICE_POLL_INTERVAL") {
            self.service.poll_interval_seconds =
                interval.parse().unwrap_or(self.service.poll_interval_seconds);
        }

        if let Ok(timeout) = std::env::var("BRANDVOICE_POLL_TIMEOUT") {
            self.service.poll_timeout_seconds =
                timeout.parse().unwrap_or(self.service.poll_timeout_seconds);
        }

        if let Ok(log_level) = std::env::var("BRANDVOICE_LOG_LEVEL") {
            self.output.log_level = log_level;
        }

        if self.llm.api_key.is_none() {
            let key_var = match self.llm.provider {
                LLMProvider::Gemini => Some("GEMINI_API_KEY"),
                LLMProvider::OpenAI => Some("OPENAI_API_KEY"),
                LLMProvider::LMStudio => None,
            };
            if let Some(var) = key_var {
                self.llm.api_key = std::env::var(var).ok();
            }
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.service.poll_interval_seconds == 0 {
            return Err(anyhow!("poll_interval_seconds must be greater than 0"));
        }

        if self.service.poll_timeout_seconds == 0 {
            return Err(anyhow!("poll_timeout_seconds must be greater than 0"));
        }

        if self.service.max_consecutive_poll_errors == 0 {
            return Err(anyhow!("max_consecutive_poll_errors must be greater than 0"));
        }

        if self.pipeline.max_char == 0 {
            return Err(anyhow!("max_char must be greater than 0"));
        }

        if self.pipeline.language.trim().is_empty() {
            return Err(anyhow!("language must not be empty"));
        }

        if self.service.base_url.trim().is_empty() {
            return Err(anyhow!("service base_url must not be empty"));
        }

        tracing::debug!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "BrandVoice Configuration:\n\
            - Batch Size: {}\n\
            - Video Limit: {}\n\
            - Poll Interval: {}s (timeout {}s)\n\
            - Transcript Mode: {:?}\n\
            - Parameter Mode: {:?}\n\
            - Output Directory: {}\n\
            - Training Directory: {}",
            self.pipeline.batch_size,
            self.pipeline
                .videos_to_process
                .map_or_else(|| "all".to_string(), |n| n.to_string()),
            self.service.poll_interval_seconds,
            self.service.poll_timeout_seconds,
            self.pipeline.transcript_mode,
            self.pipeline.parameter_mode,
            self.output.output_dir.display(),
            self.output.training_dir.display(),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            service: ServiceConfig::default(),
            llm: LLMConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            videos_to_process: None,
            parameter_mode: ParameterMode::Auto,
            transcript_mode: TranscriptMode::Plain,
            language: "English".to_string(),
            max_char: 150,
            style: String::new(),
            native_captions: true,
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.opus.pro/api".to_string(),
            api_key: None,
            curation_model: "ClipAnything".to_string(),
            request_timeout_seconds: 30,
            poll_interval_seconds: 10,
            poll_timeout_seconds: 600, // 10 minutes per project
            max_consecutive_poll_errors: 5,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
            training_dir: PathBuf::from("training_data"),
            log_level: "info".to_string(),
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.config.pipeline.batch_size = batch_size;
        self
    }

    pub fn with_video_limit(mut self, limit: usize) -> Self {
        self.config.pipeline.videos_to_process = Some(limit);
        self
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.config.service.api_key = Some(api_key);
        self
    }

    pub fn with_poll_timing(mut self, interval_seconds: u64, timeout_seconds: u64) -> Self {
        self.config.service.poll_interval_seconds = interval_seconds;
        self.config.service.poll_timeout_seconds = timeout_seconds;
        self
    }

    pub fn with_output_dirs(mut self, output_dir: PathBuf, training_dir: PathBuf) -> Self {
        self.config.output.output_dir = output_dir;
        self.config.output.training_dir = training_dir;
        self
    }

    pub fn with_transcript_mode(mut self, mode: TranscriptMode) -> Self {
        self.config.pipeline.transcript_mode = mode;
        self
    }

    pub fn with_parameter_mode(mut self, mode: ParameterMode) -> Self {
        self.config.pipeline.parameter_mode = mode;
        self
    }

    pub fn with_generation_defaults(mut self, language: String, max_char: u32) -> Self {
        self.config.pipeline.language = language;
        self.config.pipeline.max_char = max_char;
        self
    }

    pub fn with_native_captions(mut self, enabled: bool) -> Self {
        self.config.pipeline.native_captions = enabled;
        self
    }

    pub fn with_style(mut self, style: String) -> Self {
        self.config.pipeline.style = style;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
