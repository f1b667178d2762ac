//! API request handlers

use anyhow::{anyhow, Result};
use serde_json::Value;
use std::sync::Arc;

use super::models::{CreateJobRequest, CreateJobResponse, JobListEntry};
use super::server::AppState;
use crate::pipeline::PipelineInput;
use crate::progress::PipelineJob;
use crate::store::Store;

/// Handle health check requests
pub async fn health_check() -> Result<Value> {
    Ok(serde_json::json!({
        "status": "healthy",
        "service": "brandvoice",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Start a run in the background and return its id
pub async fn create_job(state: &AppState, request: CreateJobRequest) -> Result<CreateJobResponse> {
    let creator_name = request.creator_name.trim().to_string();
    if creator_name.is_empty() {
        return Err(anyhow!("creator_name must not be empty"));
    }

    let pipeline_config = request.pipeline_config(&state.pipeline.config().pipeline);
    let pipeline = Arc::new(state.pipeline.as_ref().clone().with_pipeline_config(pipeline_config));

    let run = pipeline
        .spawn(
            PipelineInput {
                creator_name,
                document: request.document,
            },
            &state.jobs,
        )
        .await;

    Ok(CreateJobResponse { job_id: run.job_id })
}

/// Snapshot every registered run, newest first
pub async fn list_jobs(state: &AppState) -> Vec<JobListEntry> {
    let mut entries = Vec::new();
    for (_, handle) in state.jobs.list().await {
        entries.push(JobListEntry::from(&handle.read_snapshot().await));
    }
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    entries
}

/// Snapshot of one run, `None` for unknown ids
pub async fn job_progress(state: &AppState, job_id: &str) -> Option<PipelineJob> {
    match state.jobs.get(job_id).await {
        Some(handle) => Some(handle.read_snapshot().await),
        None => None,
    }
}
