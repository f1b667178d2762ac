//! Completion Poller: one task per submitted project, reporting over a channel

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use super::{JobState, JobSubmission};
use crate::config::ServiceConfig;
use crate::error::{FailureReason, ItemFailure};
use crate::service::{ClipService, ServiceStage};
use crate::video::JobHandle;

/// Polling cadence and limits
#[derive(Debug, Clone, Copy)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
    pub max_consecutive_errors: u32,
}

impl PollSettings {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.poll_interval_seconds),
            timeout: Duration::from_secs(config.poll_timeout_seconds),
            max_consecutive_errors: config.max_consecutive_poll_errors.max(1),
        }
    }
}

/// Terminal result of polling one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    Failed { state: JobState, failure: ItemFailure },
}

impl PollOutcome {
    fn failed(state: JobState, reason: FailureReason, message: impl Into<String>) -> Self {
        PollOutcome::Failed {
            state,
            failure: ItemFailure::new(reason, message),
        }
    }

    pub fn state(&self) -> JobState {
        match self {
            PollOutcome::Succeeded => JobState::Succeeded,
            PollOutcome::Failed { state, .. } => *state,
        }
    }
}

/// Event sent from a polling task to the driver; the index refers to the submission list
#[derive(Debug)]
pub enum PollEvent {
    Started(usize),
    Finished(usize, PollOutcome),
}

/// Spawn one polling task per submission and return the event stream.
///
/// The channel closes once every task has reported `Finished`.
pub fn spawn_pollers(
    service: Arc<dyn ClipService>,
    submissions: &[JobSubmission],
    settings: PollSettings,
) -> mpsc::Receiver<PollEvent> {
    // Each task sends exactly two events, so sends never wait on the driver
    let (tx, rx) = mpsc::channel((submissions.len() * 2).max(1));

    for (index, submission) in submissions.iter().enumerate() {
        let service = Arc::clone(&service);
        let handle = submission.job_handle.clone();
        let tx = tx.clone();

        tokio::spawn(async move {
            if tx.send(PollEvent::Started(index)).await.is_err() {
                return;
            }
            let outcome = poll_until_done(service.as_ref(), &handle, settings).await;
            if let Err(e) = tx.send(PollEvent::Finished(index, outcome)).await {
                error!("Failed to report poll result for {}: {}", handle, e);
            }
        });
    }

    rx
}

/// Check status immediately, then every `interval`, until a terminal outcome
pub async fn poll_until_done(
    service: &dyn ClipService,
    handle: &JobHandle,
    settings: PollSettings,
) -> PollOutcome {
    let started = Instant::now();
    let mut last_error: Option<String> = None;
    let mut error_streak = 0u32;

    loop {
        match service.status(handle).await {
            Ok(stage) => {
                last_error = None;
                error_streak = 0;

                match stage {
                    ServiceStage::Complete => {
                        info!("✅ Project {} complete", handle);
                        return PollOutcome::Succeeded;
                    }
                    ServiceStage::Failed => {
                        warn!("❌ Project {} failed", handle);
                        return PollOutcome::failed(
                            JobState::Failed,
                            FailureReason::JobFailed,
                            "service reported FAILED",
                        );
                    }
                    ServiceStage::Error => {
                        warn!("❌ Project {} errored", handle);
                        return PollOutcome::failed(
                            JobState::Failed,
                            FailureReason::JobErrored,
                            "service reported ERROR",
                        );
                    }
                    ServiceStage::Stalled => {
                        warn!("⏸️ Project {} stalled", handle);
                        return PollOutcome::failed(
                            JobState::Stalled,
                            FailureReason::JobStalled,
                            "service reported STALLED",
                        );
                    }
                    ServiceStage::InProgress(label) => {
                        debug!("⏳ Project {} stage {}", handle, label);
                    }
                }
            }
            Err(e) => {
                let message = e.to_string();
                if last_error.as_deref() == Some(message.as_str()) {
                    error_streak += 1;
                } else {
                    error_streak = 1;
                    last_error = Some(message.clone());
                }

                warn!(
                    "Status check for {} failed ({}/{}): {}",
                    handle, error_streak, settings.max_consecutive_errors, message
                );

                if error_streak >= settings.max_consecutive_errors {
                    return PollOutcome::failed(
                        JobState::Failed,
                        FailureReason::PollErrors,
                        format!("{} consecutive status errors: {}", error_streak, message),
                    );
                }
            }
        }

        let elapsed = started.elapsed();
        if elapsed >= settings.timeout {
            warn!("⏰ Project {} timed out after {}s", handle, elapsed.as_secs());
            return PollOutcome::failed(
                JobState::TimedOut,
                FailureReason::TimedOut,
                format!("not complete after {}s", settings.timeout.as_secs()),
            );
        }

        sleep(settings.interval).await;
    }
}
