//! Artifact Writers: CSV records and JSONL training corpus for a finished run

pub mod table;
pub mod training;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::OutputConfig;
use crate::llm::GenerationParameters;
use crate::video::VideoRecord;

/// Locations of the artifacts written for a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub csv: PathBuf,
    pub jsonl: PathBuf,
}

/// `{creator}_{YYYYmmdd_HHMMSS}`, shared by both artifacts of a run
pub fn artifact_stem(creator: &str) -> String {
    format!("{}_{}", creator, chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

pub fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|name| name.to_string_lossy().into_owned())
}

/// Write the CSV into `output_dir` and the JSONL into `training_dir`
pub async fn write_artifacts(
    creator: &str,
    records: &[VideoRecord],
    parameters: &GenerationParameters,
    style: &str,
    output: &OutputConfig,
) -> Result<ArtifactPaths> {
    tokio::fs::create_dir_all(&output.output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output.output_dir.display()))?;
    tokio::fs::create_dir_all(&output.training_dir)
        .await
        .with_context(|| format!("Failed to create {}", output.training_dir.display()))?;

    let stem = artifact_stem(creator);
    let paths = ArtifactPaths {
        csv: output.output_dir.join(format!("{}.csv", stem)),
        jsonl: output.training_dir.join(format!("{}.jsonl", stem)),
    };

    table::write_csv(&paths.csv, records).await?;
    info!("💾 CSV saved to: {} ({} rows)", paths.csv.display(), records.len());

    training::write_jsonl(&paths.jsonl, records, parameters, style).await?;
    info!("💾 Training data saved to: {}", paths.jsonl.display());

    Ok(paths)
}
