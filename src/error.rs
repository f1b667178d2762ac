//! Error types shared across the pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::pipeline::JobState;

/// Result type for whole-run operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Errors that abort an entire run
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("No videos found in input document")]
    NoInputRecords,

    #[error("No projects submitted successfully ({failed} submission failures)")]
    NoSubmissions { failed: usize },

    #[error("No projects completed successfully ({failed} of {submitted} failed or timed out)")]
    NoCompletedJobs { submitted: usize, failed: usize },

    #[error("No transcripts extracted")]
    NoTranscripts,

    #[error("Failed to write artifacts: {0}")]
    Artifacts(#[source] anyhow::Error),
}

/// Errors raised by the external clip-processing service boundary
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Service response did not include a project id")]
    MissingHandle,

    #[error("Unexpected service response: {0}")]
    Decode(String),

    #[error("Service credentials not configured")]
    MissingCredentials,
}

/// Rejected [`JobState`] transition
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Illegal job state transition {from:?} -> {to:?}")]
pub struct StateTransitionError {
    pub from: JobState,
    pub to: JobState,
}

/// Stage in which a per-item failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Submission,
    Polling,
    Extraction,
}

/// Why a single item dropped out of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    SubmissionFailed,
    MissingJobHandle,
    JobFailed,
    JobErrored,
    JobStalled,
    TimedOut,
    PollErrors,
    ResultUnavailable,
    MissingScreenplay,
    EmptyTranscript,
}

impl FailureReason {
    pub fn stage(&self) -> FailureStage {
        match self {
            FailureReason::SubmissionFailed | FailureReason::MissingJobHandle => {
                FailureStage::Submission
            }
            FailureReason::JobFailed
            | FailureReason::JobErrored
            | FailureReason::JobStalled
            | FailureReason::TimedOut
            | FailureReason::PollErrors => FailureStage::Polling,
            FailureReason::ResultUnavailable
            | FailureReason::MissingScreenplay
            | FailureReason::EmptyTranscript => FailureStage::Extraction,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureReason::SubmissionFailed => "submission failed",
            FailureReason::MissingJobHandle => "no project id returned",
            FailureReason::JobFailed => "project failed",
            FailureReason::JobErrored => "project errored",
            FailureReason::JobStalled => "project stalled",
            FailureReason::TimedOut => "timed out",
            FailureReason::PollErrors => "status checks kept failing",
            FailureReason::ResultUnavailable => "no exportable clips",
            FailureReason::MissingScreenplay => "no screenplay in clip",
            FailureReason::EmptyTranscript => "empty transcript",
        };
        f.write_str(label)
    }
}

/// A per-item failure with its human-readable detail
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub reason: FailureReason,
    pub message: String,
}

impl ItemFailure {
    pub fn new(reason: FailureReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

impl fmt::Display for ItemFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_reason_stages() {
        assert_eq!(FailureReason::MissingJobHandle.stage(), FailureStage::Submission);
        assert_eq!(FailureReason::TimedOut.stage(), FailureStage::Polling);
        assert_eq!(FailureReason::JobStalled.stage(), FailureStage::Polling);
        assert_eq!(FailureReason::EmptyTranscript.stage(), FailureStage::Extraction);
    }

    #[test]
    fn test_failure_reason_serializes_snake_case() {
        let json = serde_json::to_string(&FailureReason::PollErrors).unwrap();
        assert_eq!(json, "\"poll_errors\"");
    }
}
