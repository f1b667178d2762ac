//! Run driver: input document to CSV and JSONL artifacts

pub mod extract;
pub mod poll;
pub mod submit;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::artifacts::{self, ArtifactPaths};
use crate::captions::{resolve_native_captions, CaptionFetcher};
use crate::config::{Config, ParameterMode, PipelineConfig, TranscriptMode};
use crate::dedup;
use crate::error::{FailureReason, ItemFailure, PipelineError, Result, StateTransitionError};
use crate::llm::{GenerationParameters, ParameterAdvisor, LLM};
use crate::normalize::normalize_document;
use crate::progress::{
    ItemStatus, PipelineJob, ProgressHandle, ProgressTracker, RunSummary, VideoStatus,
};
use crate::service::ClipService;
use crate::store::Store;
use crate::video::{self, JobHandle, TranscriptSource, VideoRecord};

use self::extract::extract_transcript;
use self::poll::{spawn_pollers, PollEvent, PollOutcome, PollSettings};
use self::submit::{interpolate, submit_pending};

/// Lifecycle of one submitted project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Submitted,
    Polling,
    Succeeded,
    Failed,
    Stalled,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::Stalled | JobState::TimedOut
        )
    }

    /// Move forward along submitted -> polling -> terminal
    pub fn transition(self, next: JobState) -> std::result::Result<JobState, StateTransitionError> {
        let allowed = match (self, next) {
            (JobState::Submitted, JobState::Polling) => true,
            (JobState::Polling, next) => next.is_terminal(),
            _ => false,
        };

        if allowed {
            Ok(next)
        } else {
            Err(StateTransitionError {
                from: self,
                to: next,
            })
        }
    }
}

/// A record that was accepted by the service, by index into the run's record list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSubmission {
    pub index: usize,
    pub video_id: String,
    pub job_handle: JobHandle,
}

/// Input of one run
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub creator_name: String,
    pub document: Value,
}

/// Result of a finished run
#[derive(Debug, Clone)]
pub struct RunOutput {
    /// Records with transcripts, sorted by views
    pub records: Vec<VideoRecord>,
    pub csv_path: Option<PathBuf>,
    pub jsonl_path: Option<PathBuf>,
    pub summary: RunSummary,
}

/// A spawned run: its id, a progress reader and the task driving it
pub struct RunHandle {
    pub job_id: String,
    pub progress: ProgressHandle,
    task: JoinHandle<Result<RunOutput>>,
}

impl RunHandle {
    /// Wait for the run to finish
    pub async fn wait(self) -> anyhow::Result<RunOutput> {
        let result = self
            .task
            .await
            .map_err(|e| anyhow!("Pipeline task for {} aborted: {}", self.job_id, e))?;
        Ok(result?)
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Clip-transcript pipeline with its collaborators
#[derive(Clone)]
pub struct Pipeline {
    config: Config,
    service: Arc<dyn ClipService>,
    captions: Option<Arc<dyn CaptionFetcher>>,
    llm: Option<Arc<dyn LLM>>,
}

impl Pipeline {
    pub fn new(config: Config, service: Arc<dyn ClipService>) -> Self {
        Self {
            config,
            service,
            captions: None,
            llm: None,
        }
    }

    pub fn with_captions(mut self, captions: Arc<dyn CaptionFetcher>) -> Self {
        self.captions = Some(captions);
        self
    }

    pub fn with_llm(mut self, llm: Arc<dyn LLM>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Replace the per-run settings, keeping service and collaborator settings
    pub fn with_pipeline_config(mut self, pipeline: PipelineConfig) -> Self {
        self.config.pipeline = pipeline;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Register a new run in `store` and drive it on its own task
    pub async fn spawn(
        self: Arc<Self>,
        input: PipelineInput,
        store: &dyn Store<ProgressHandle>,
    ) -> RunHandle {
        let job_id = uuid::Uuid::new_v4().to_string();
        let tracker = ProgressTracker::new(PipelineJob::new(
            job_id.clone(),
            input.creator_name.clone(),
            self.config.pipeline.clone(),
        ));
        let progress = tracker.handle();
        store.put(job_id.clone(), progress.clone()).await;

        info!("🚀 Starting run {} for {}", job_id, input.creator_name);

        let task = tokio::spawn(async move { self.execute(input, tracker).await });

        RunHandle {
            job_id,
            progress,
            task,
        }
    }

    /// Run to completion, recording a fatal error on the tracker
    pub async fn execute(
        &self,
        input: PipelineInput,
        tracker: ProgressTracker,
    ) -> Result<RunOutput> {
        match self.run(input, &tracker).await {
            Ok(output) => Ok(output),
            Err(e) => {
                error!("❌ Run failed: {}", e);
                tracker.fail(e.to_string()).await;
                Err(e)
            }
        }
    }

    async fn run(&self, input: PipelineInput, tracker: &ProgressTracker) -> Result<RunOutput> {
        let started = Instant::now();
        let pipeline_config = &self.config.pipeline;
        let creator = input.creator_name.as_str();

        tracker.set_phase("Parsing input", 0).await;
        let mut records = normalize_document(&input.document);
        if records.is_empty() {
            return Err(PipelineError::NoInputRecords);
        }
        if let Some(limit) = pipeline_config.videos_to_process {
            records.truncate(limit);
        }
        info!("📹 {} videos selected for {}", records.len(), creator);

        tracker.set_phase("Checking for duplicates", 5).await;
        let existing = dedup::existing_video_ids(creator, &self.config.output.output_dir).await;
        tracker
            .push_items(
                records
                    .iter()
                    .map(|record| {
                        let status = if existing.contains(&record.video_id) {
                            ItemStatus::Skipped
                        } else {
                            ItemStatus::Pending
                        };
                        VideoStatus::new(record, status)
                    })
                    .collect(),
            )
            .await;
        let (mut records, skipped) = dedup::partition_new(records, &existing);
        tracker.set_progress(10).await;

        if records.is_empty() {
            info!("📋 All {} videos already processed for {}", skipped.len(), creator);
            let summary = RunSummary::new(0, skipped.len(), 0, started.elapsed().as_secs_f64());
            tracker.complete(summary.clone(), None, None).await;
            return Ok(RunOutput {
                records: Vec::new(),
                csv_path: None,
                jsonl_path: None,
                summary,
            });
        }

        let native = self.resolve_captions(&mut records, tracker).await;

        tracker.set_phase("Submitting videos", 10).await;
        let pending: Vec<usize> = (0..records.len())
            .filter(|&i| !records[i].has_transcript())
            .collect();
        let report = submit_pending(
            self.service.as_ref(),
            &mut records,
            &pending,
            pipeline_config.batch_size,
            tracker,
            (10, 30),
        )
        .await;

        if report.submissions.is_empty() && native == 0 {
            return Err(PipelineError::NoSubmissions {
                failed: report.failed,
            });
        }

        tracker.set_phase("Processing videos", 30).await;
        let succeeded = self
            .await_results(&report.submissions, &mut records, tracker)
            .await;

        if succeeded == 0 && native == 0 {
            return Err(PipelineError::NoCompletedJobs {
                submitted: report.submissions.len(),
                failed: report.submissions.len(),
            });
        }

        let attempted = records.len();
        let mut transcribed: Vec<VideoRecord> = records
            .into_iter()
            .filter(VideoRecord::has_transcript)
            .collect();
        video::sort_by_views(&mut transcribed);
        if transcribed.is_empty() {
            return Err(PipelineError::NoTranscripts);
        }

        tracker.set_phase("Analyzing content", 90).await;
        let parameters = self.resolve_parameters(&transcribed).await;
        tracker.set_parameters(parameters.clone()).await;

        tracker.set_phase("Writing artifacts", 95).await;
        let ArtifactPaths { csv, jsonl } = artifacts::write_artifacts(
            creator,
            &transcribed,
            &parameters,
            &pipeline_config.style,
            &self.config.output,
        )
        .await
        .map_err(PipelineError::Artifacts)?;

        let summary = RunSummary::new(
            transcribed.len(),
            skipped.len(),
            attempted - transcribed.len(),
            started.elapsed().as_secs_f64(),
        );
        info!(
            "🎉 Run complete: {} processed, {} skipped, {} failed in {}",
            summary.processed, summary.skipped, summary.failed, summary.total_time
        );

        tracker
            .complete(
                summary.clone(),
                artifacts::file_name(&csv),
                artifacts::file_name(&jsonl),
            )
            .await;

        Ok(RunOutput {
            records: transcribed,
            csv_path: Some(csv),
            jsonl_path: Some(jsonl),
            summary,
        })
    }

    /// Native captions first; returns how many records got one
    async fn resolve_captions(
        &self,
        records: &mut [VideoRecord],
        tracker: &ProgressTracker,
    ) -> usize {
        let fetcher = match &self.captions {
            Some(fetcher) if self.config.pipeline.native_captions => fetcher,
            _ => return 0,
        };

        tracker.set_phase("Checking native captions", 10).await;
        let resolved = resolve_native_captions(fetcher, records).await;
        for &index in &resolved {
            let record = &records[index];
            tracker
                .update_item(
                    &record.video_id,
                    ItemStatus::Completed {
                        transcript_source: TranscriptSource::NativeCaptions,
                        transcript_length: record.transcript_len(),
                        job_handle: None,
                    },
                )
                .await;
        }
        resolved.len()
    }

    /// Fan out pollers and extract each transcript as its project succeeds.
    ///
    /// Returns the number of projects that reached `Succeeded`.
    async fn await_results(
        &self,
        submissions: &[JobSubmission],
        records: &mut [VideoRecord],
        tracker: &ProgressTracker,
    ) -> usize {
        if submissions.is_empty() {
            return 0;
        }

        let settings = PollSettings::from_config(&self.config.service);
        let mode = self.config.pipeline.transcript_mode;
        let mut states = vec![JobState::Submitted; submissions.len()];
        let mut resolved = 0;
        let mut succeeded = 0;

        info!("⏳ Polling {} projects", submissions.len());
        let mut events = spawn_pollers(Arc::clone(&self.service), submissions, settings);

        while let Some(event) = events.recv().await {
            match event {
                PollEvent::Started(i) => {
                    let submission = &submissions[i];
                    if self.advance_state(&mut states[i], JobState::Polling, submission) {
                        tracker
                            .update_item(
                                &submission.video_id,
                                ItemStatus::Polling {
                                    job_handle: submission.job_handle.clone(),
                                    state: JobState::Polling,
                                },
                            )
                            .await;
                    }
                }
                PollEvent::Finished(i, outcome) => {
                    let submission = &submissions[i];
                    resolved += 1;
                    if !self.advance_state(&mut states[i], outcome.state(), submission) {
                        continue;
                    }

                    let record = &mut records[submission.index];
                    match outcome {
                        PollOutcome::Succeeded => {
                            succeeded += 1;
                            self.extract_into(record, &submission.job_handle, mode, tracker)
                                .await;
                        }
                        PollOutcome::Failed { failure, .. } => {
                            warn!("❌ {} dropped: {}", record.video_id, failure);
                            record.mark_transcript_error();
                            tracker
                                .update_item(&record.video_id, ItemStatus::failed(failure))
                                .await;
                        }
                    }

                    tracker
                        .set_progress(interpolate(30, 90, resolved, submissions.len()))
                        .await;
                }
            }
        }

        info!(
            "📊 Polling finished: {}/{} projects succeeded",
            succeeded,
            submissions.len()
        );
        succeeded
    }

    fn advance_state(
        &self,
        state: &mut JobState,
        next: JobState,
        submission: &JobSubmission,
    ) -> bool {
        match state.transition(next) {
            Ok(next) => {
                *state = next;
                true
            }
            Err(e) => {
                warn!("Ignoring event for {}: {}", submission.job_handle, e);
                false
            }
        }
    }

    async fn extract_into(
        &self,
        record: &mut VideoRecord,
        handle: &JobHandle,
        mode: TranscriptMode,
        tracker: &ProgressTracker,
    ) {
        tracker
            .update_item(
                &record.video_id,
                ItemStatus::Extracting {
                    job_handle: handle.clone(),
                },
            )
            .await;

        let extracted = extract_transcript(self.service.as_ref(), handle, mode)
            .await
            .and_then(|text| {
                if record.attach_transcript(text, TranscriptSource::ExternalService) {
                    Ok(record.transcript_len())
                } else {
                    Err(ItemFailure::new(
                        FailureReason::EmptyTranscript,
                        format!("blank transcript for {}", handle),
                    ))
                }
            });

        let status = match extracted {
            Ok(transcript_length) => {
                info!("📝 Transcript for {} ({} chars)", record.video_id, transcript_length);
                ItemStatus::Completed {
                    transcript_source: TranscriptSource::ExternalService,
                    transcript_length,
                    job_handle: Some(handle.clone()),
                }
            }
            Err(failure) => {
                warn!("❌ Extraction failed for {}: {}", record.video_id, failure);
                record.mark_transcript_error();
                ItemStatus::failed(failure)
            }
        };

        tracker.update_item(&record.video_id, status).await;
    }

    async fn resolve_parameters(&self, records: &[VideoRecord]) -> GenerationParameters {
        let pipeline_config = &self.config.pipeline;
        if pipeline_config.parameter_mode == ParameterMode::Manual || !self.config.llm.enabled {
            return GenerationParameters::from_config(pipeline_config);
        }

        ParameterAdvisor::new(self.llm.clone(), self.config.llm.sample_size)
            .resolve(pipeline_config, records)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_moves_forward_only() {
        let polling = tokio_test::assert_ok!(JobState::Submitted.transition(JobState::Polling));
        assert_eq!(polling, JobState::Polling);
        assert_eq!(polling.transition(JobState::TimedOut), Ok(JobState::TimedOut));

        tokio_test::assert_err!(JobState::Submitted.transition(JobState::Succeeded));
        tokio_test::assert_err!(JobState::Polling.transition(JobState::Submitted));
        tokio_test::assert_err!(JobState::Succeeded.transition(JobState::Failed));
        tokio_test::assert_err!(JobState::Stalled.transition(JobState::Polling));
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Submitted.is_terminal());
        assert!(!JobState::Polling.is_terminal());
        assert!(JobState::TimedOut.is_terminal());
    }
}
