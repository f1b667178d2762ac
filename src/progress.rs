//! Run-level progress state shared between the driver and any number of readers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{FailureReason, FailureStage, ItemFailure};
use crate::llm::GenerationParameters;
use crate::pipeline::JobState;
use crate::video::{JobHandle, TranscriptSource, VideoRecord};

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Processing,
    Completed,
    Error,
}

/// Status of a single video within a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Skipped,
    Submitted {
        job_handle: JobHandle,
    },
    Polling {
        job_handle: JobHandle,
        state: JobState,
    },
    Extracting {
        job_handle: JobHandle,
    },
    Completed {
        transcript_source: TranscriptSource,
        transcript_length: usize,
        job_handle: Option<JobHandle>,
    },
    Failed {
        stage: FailureStage,
        reason: FailureReason,
        message: String,
    },
}

impl ItemStatus {
    pub fn failed(failure: ItemFailure) -> Self {
        ItemStatus::Failed {
            stage: failure.reason.stage(),
            reason: failure.reason,
            message: failure.message,
        }
    }

    /// Terminal entries are never overwritten
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ItemStatus::Skipped | ItemStatus::Completed { .. } | ItemStatus::Failed { .. }
        )
    }
}

/// Per-video entry in the run's status list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoStatus {
    pub id: String,
    pub title: String,
    pub view_count: u64,
    #[serde(flatten)]
    pub status: ItemStatus,
}

impl VideoStatus {
    pub fn new(record: &VideoRecord, status: ItemStatus) -> Self {
        Self {
            id: record.video_id.clone(),
            title: record.title(),
            view_count: record.view_count,
            status,
        }
    }
}

/// Final counts for a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed_secs: f64,
    pub total_time: String,
}

impl RunSummary {
    pub fn new(processed: usize, skipped: usize, failed: usize, elapsed_secs: f64) -> Self {
        Self {
            processed,
            skipped,
            failed,
            elapsed_secs,
            total_time: format_duration(elapsed_secs as u64),
        }
    }
}

/// Human-readable duration: `1h 23m`, `4m 5s` or `12s`
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

/// Snapshot-able state of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineJob {
    pub job_id: String,
    pub creator_name: String,
    pub config: PipelineConfig,
    pub status: RunStatus,
    pub progress: u8,
    pub current_phase: String,
    pub videos: Vec<VideoStatus>,
    pub summary: Option<RunSummary>,
    pub error: Option<String>,
    pub parameters: Option<GenerationParameters>,
    pub csv_filename: Option<String>,
    pub jsonl_filename: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PipelineJob {
    pub fn new(job_id: String, creator_name: String, config: PipelineConfig) -> Self {
        Self {
            job_id,
            creator_name,
            config,
            status: RunStatus::Processing,
            progress: 0,
            current_phase: "Initializing".to_string(),
            videos: Vec::new(),
            summary: None,
            error: None,
            parameters: None,
            csv_filename: None,
            jsonl_filename: None,
            created_at: Utc::now(),
        }
    }

    pub fn item(&self, video_id: &str) -> Option<&VideoStatus> {
        self.videos.iter().find(|v| v.id == video_id)
    }

    fn advance(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }
}

/// Exclusive writer for a run's [`PipelineJob`], owned by the driver
#[derive(Debug)]
pub struct ProgressTracker {
    job: Arc<RwLock<PipelineJob>>,
}

/// Cloneable read-only view of a run's [`PipelineJob`]
#[derive(Debug, Clone)]
pub struct ProgressHandle {
    job: Arc<RwLock<PipelineJob>>,
}

impl ProgressHandle {
    pub async fn read_snapshot(&self) -> PipelineJob {
        self.job.read().await.clone()
    }
}

impl ProgressTracker {
    pub fn new(job: PipelineJob) -> Self {
        Self {
            job: Arc::new(RwLock::new(job)),
        }
    }

    pub fn handle(&self) -> ProgressHandle {
        ProgressHandle {
            job: Arc::clone(&self.job),
        }
    }

    /// Enter a new phase; progress only moves forward
    pub async fn set_phase(&self, phase: &str, progress: u8) {
        let mut job = self.job.write().await;
        debug!("📍 {} ({}%)", phase, progress);
        job.current_phase = phase.to_string();
        job.advance(progress);
    }

    pub async fn set_progress(&self, progress: u8) {
        self.job.write().await.advance(progress);
    }

    pub async fn push_items(&self, items: Vec<VideoStatus>) {
        self.job.write().await.videos.extend(items);
    }

    /// Replace an item's status unless it is already terminal
    pub async fn update_item(&self, video_id: &str, status: ItemStatus) -> bool {
        let mut job = self.job.write().await;
        match job.videos.iter_mut().find(|v| v.id == video_id) {
            Some(entry) if !entry.status.is_terminal() => {
                entry.status = status;
                true
            }
            Some(_) => {
                debug!("Ignoring update for finished item {}", video_id);
                false
            }
            None => false,
        }
    }

    pub async fn set_parameters(&self, parameters: GenerationParameters) {
        self.job.write().await.parameters = Some(parameters);
    }

    pub async fn complete(
        &self,
        summary: RunSummary,
        csv_filename: Option<String>,
        jsonl_filename: Option<String>,
    ) {
        let mut job = self.job.write().await;
        if job.status != RunStatus::Processing {
            return;
        }
        job.status = RunStatus::Completed;
        job.current_phase = "Completed".to_string();
        job.advance(100);
        job.summary = Some(summary);
        job.csv_filename = csv_filename;
        job.jsonl_filename = jsonl_filename;
    }

    pub async fn fail(&self, message: String) {
        let mut job = self.job.write().await;
        if job.status != RunStatus::Processing {
            return;
        }
        job.status = RunStatus::Error;
        job.current_phase = "Error".to_string();
        job.error = Some(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn tracker_with(ids: &[&str]) -> ProgressTracker {
        let tracker = ProgressTracker::new(PipelineJob::new(
            "job".to_string(),
            "creator".to_string(),
            PipelineConfig::default(),
        ));
        let items = ids
            .iter()
            .map(|id| VideoStatus::new(&VideoRecord::bare(*id), ItemStatus::Pending))
            .collect();
        tracker.push_items(items).await;
        tracker
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(12), "12s");
        assert_eq!(format_duration(245), "4m 5s");
        assert_eq!(format_duration(4980), "1h 23m");
    }

    #[tokio::test]
    async fn test_progress_never_decreases() {
        let tracker = tracker_with(&[]).await;
        let handle = tracker.handle();

        tracker.set_phase("Submitting", 30).await;
        tracker.set_phase("Late", 10).await;
        tracker.set_progress(250).await;

        let snapshot = handle.read_snapshot().await;
        assert_eq!(snapshot.current_phase, "Late");
        assert_eq!(snapshot.progress, 100);
    }

    #[tokio::test]
    async fn test_terminal_items_are_not_overwritten() {
        let tracker = tracker_with(&["a", "b"]).await;

        assert!(tracker.update_item("a", ItemStatus::Skipped).await);
        assert!(!tracker.update_item("a", ItemStatus::Pending).await);
        assert!(!tracker.update_item("missing", ItemStatus::Pending).await);
        assert!(
            tracker
                .update_item("b", ItemStatus::Submitted { job_handle: JobHandle::new("p1") })
                .await
        );

        let snapshot = tracker.handle().read_snapshot().await;
        assert_eq!(snapshot.item("a").unwrap().status, ItemStatus::Skipped);
        assert!(matches!(
            snapshot.item("b").unwrap().status,
            ItemStatus::Submitted { .. }
        ));
    }

    #[tokio::test]
    async fn test_snapshot_outlives_tracker() {
        let tracker = tracker_with(&["a"]).await;
        let handle = tracker.handle();
        tracker.fail("boom".to_string()).await;
        drop(tracker);

        let snapshot = handle.read_snapshot().await;
        assert_eq!(snapshot.status, RunStatus::Error);
        assert_eq!(snapshot.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_item_status_serializes_tagged() {
        let status = VideoStatus::new(
            &VideoRecord::bare("v1"),
            ItemStatus::failed(ItemFailure::new(FailureReason::TimedOut, "600s elapsed")),
        );
        let value = serde_json::to_value(&status).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["stage"], "polling");
        assert_eq!(value["reason"], "timed_out");
    }
}
