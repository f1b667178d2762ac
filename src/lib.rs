/// BrandVoice clip-transcript pipeline
///
/// Turns a social-video listing into transcribed CSV records and an LLM fine-tuning corpus,
/// using an external clip-processing service for transcripts.

pub mod artifacts;
pub mod captions;
pub mod config;
pub mod dedup;
pub mod error;
pub mod llm;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod service;
pub mod store;
pub mod video;

#[cfg(feature = "api")]
pub mod api;

// Re-export main types for easy access
pub use crate::captions::{CaptionFetcher, SubtitleUrlFetcher};
pub use crate::config::{Config, ConfigBuilder, ParameterMode, TranscriptMode};
pub use crate::error::{FailureReason, PipelineError, ServiceError};
pub use crate::llm::{create_llm, GenerationParameters, LLMConfig, LLMProvider, LLM};
pub use crate::pipeline::{JobState, Pipeline, PipelineInput, RunHandle, RunOutput};
pub use crate::progress::{ItemStatus, PipelineJob, ProgressHandle, RunStatus, RunSummary};
pub use crate::service::{ClipService, OpusClipClient, ServiceStage};
pub use crate::store::{MemoryStore, Store};
pub use crate::video::{JobHandle, TranscriptSource, VideoRecord};
