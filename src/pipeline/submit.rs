//! Job Submitter: sequential submission in batch groups

use tracing::{info, warn};

use super::JobSubmission;
use crate::error::{FailureReason, ItemFailure, ServiceError};
use crate::progress::{ItemStatus, ProgressTracker};
use crate::service::ClipService;
use crate::video::VideoRecord;

/// Outcome of submitting a set of records
#[derive(Debug, Default)]
pub struct SubmissionReport {
    pub submissions: Vec<JobSubmission>,
    pub failed: usize,
}

/// Submit `records[i]` for every `i` in `pending`, batch by batch.
///
/// Progress moves linearly from `progress_from` to `progress_to` as items are submitted.
pub async fn submit_pending(
    service: &dyn ClipService,
    records: &mut [VideoRecord],
    pending: &[usize],
    batch_size: usize,
    tracker: &ProgressTracker,
    (progress_from, progress_to): (u8, u8),
) -> SubmissionReport {
    let mut report = SubmissionReport::default();
    let batch_size = batch_size.max(1);
    let total = pending.len();
    let batch_count = (total + batch_size - 1) / batch_size;

    for (batch_index, batch) in pending.chunks(batch_size).enumerate() {
        info!(
            "📤 Submitting batch {}/{} ({} videos)",
            batch_index + 1,
            batch_count,
            batch.len()
        );

        for &index in batch {
            let record = &mut records[index];

            match service.submit(&record.video_url).await {
                Ok(handle) => {
                    info!("✅ Submitted {} as project {}", record.video_id, handle);
                    record.attach_job_handle(handle.clone());
                    tracker
                        .update_item(
                            &record.video_id,
                            ItemStatus::Submitted {
                                job_handle: handle.clone(),
                            },
                        )
                        .await;
                    report.submissions.push(JobSubmission {
                        index,
                        video_id: record.video_id.clone(),
                        job_handle: handle,
                    });
                }
                Err(e) => {
                    let failure = submission_failure(e);
                    warn!("❌ Submission failed for {}: {}", record.video_id, failure);
                    tracker
                        .update_item(&record.video_id, ItemStatus::failed(failure))
                        .await;
                    report.failed += 1;
                }
            }

            let done = report.submissions.len() + report.failed;
            tracker
                .set_progress(interpolate(progress_from, progress_to, done, total))
                .await;
        }
    }

    info!(
        "📤 Submission finished: {} submitted, {} failed",
        report.submissions.len(),
        report.failed
    );
    report
}

fn submission_failure(error: ServiceError) -> ItemFailure {
    match error {
        ServiceError::MissingHandle => {
            ItemFailure::new(FailureReason::MissingJobHandle, error.to_string())
        }
        other => ItemFailure::new(FailureReason::SubmissionFailed, other.to_string()),
    }
}

/// Linear progress between two bounds for `done` of `total` items
pub(crate) fn interpolate(from: u8, to: u8, done: usize, total: usize) -> u8 {
    if total == 0 {
        return to;
    }
    let span = f64::from(to.saturating_sub(from));
    from + (span * done.min(total) as f64 / total as f64) as u8
}
