//! Boundary to the external clip-processing service

pub mod opus;
pub mod screenplay;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ServiceError;
use crate::video::JobHandle;

pub use opus::OpusClipClient;
pub use screenplay::{ExportableClip, LineKind, Screenplay, ScreenplayChapter, ScreenplayLine};

/// Processing stage reported by the service for a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceStage {
    Complete,
    Failed,
    Error,
    Stalled,
    /// Any non-terminal stage, with the raw label the service reported
    InProgress(String),
}

impl ServiceStage {
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "COMPLETE" | "COMPLETED" => ServiceStage::Complete,
            "FAILED" => ServiceStage::Failed,
            "ERROR" => ServiceStage::Error,
            "STALLED" => ServiceStage::Stalled,
            _ => ServiceStage::InProgress(label.to_string()),
        }
    }
}

/// The three operations the pipeline needs from a long-running job service.
///
/// Implementations only perform single requests; retries, polling cadence and
/// timeouts belong to the pipeline.
#[async_trait]
pub trait ClipService: Send + Sync {
    /// Submit a video URL, returning the handle of the created project
    async fn submit(&self, video_url: &str) -> Result<JobHandle, ServiceError>;

    /// Current processing stage of a project
    async fn status(&self, handle: &JobHandle) -> Result<ServiceStage, ServiceError>;

    /// Exportable results of a completed project
    async fn fetch_result(&self, handle: &JobHandle) -> Result<Vec<ExportableClip>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_from_label() {
        assert_eq!(ServiceStage::from_label("COMPLETE"), ServiceStage::Complete);
        assert_eq!(ServiceStage::from_label("stalled"), ServiceStage::Stalled);
        assert_eq!(ServiceStage::from_label("ERROR"), ServiceStage::Error);
        assert_eq!(
            ServiceStage::from_label("CURATING"),
            ServiceStage::InProgress("CURATING".to_string())
        );
        assert_eq!(ServiceStage::from_label("completed"), ServiceStage::Complete);
    }
}
