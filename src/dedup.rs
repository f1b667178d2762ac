//! Dedup Gate: identifiers already written to earlier CSV artifacts of a channel

use anyhow::{anyhow, Result};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::video::VideoRecord;

/// Column holding the identifier in CSV artifacts
pub const ID_COLUMN: &str = "video_id";

/// Collect every identifier present in `{channel}_*.csv` files inside `output_dir`
pub async fn existing_video_ids(channel: &str, output_dir: &Path) -> HashSet<String> {
    let mut existing = HashSet::new();

    let files = match matching_artifacts(channel, output_dir).await {
        Ok(files) => files,
        Err(e) => {
            debug!("No prior artifacts readable in {}: {}", output_dir.display(), e);
            return existing;
        }
    };

    for path in files {
        match read_ids(&path).await {
            Ok(ids) => {
                debug!("📋 {} ids in {}", ids.len(), path.display());
                existing.extend(ids);
            }
            Err(e) => {
                warn!("⚠️ Skipping prior artifact {}: {}", path.display(), e);
            }
        }
    }

    if !existing.is_empty() {
        info!("📋 {} videos already processed for channel {}", existing.len(), channel);
    }
    existing
}

/// Split records into (new, skipped) against a set of known identifiers
pub fn partition_new(
    records: Vec<VideoRecord>,
    existing: &HashSet<String>,
) -> (Vec<VideoRecord>, Vec<VideoRecord>) {
    records
        .into_iter()
        .partition(|record| !existing.contains(&record.video_id))
}

async fn matching_artifacts(channel: &str, output_dir: &Path) -> Result<Vec<PathBuf>> {
    let prefix = format!("{}_", channel);
    let mut entries = fs::read_dir(output_dir).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if name.starts_with(&prefix) && name.ends_with(".csv") && path.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

async fn read_ids(path: &Path) -> Result<Vec<String>> {
    let bytes = fs::read(path).await?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(bytes.as_slice());

    let column = reader
        .headers()?
        .iter()
        .position(|header| header.trim() == ID_COLUMN)
        .ok_or_else(|| anyhow!("no '{}' column", ID_COLUMN))?;

    let mut ids = Vec::new();
    for row in reader.records() {
        match row {
            Ok(row) => {
                if let Some(id) = row.get(column).map(str::trim).filter(|id| !id.is_empty()) {
                    ids.push(id.to_string());
                }
            }
            Err(e) => warn!("⚠️ Malformed row in {}: {}", path.display(), e),
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let ids = existing_video_ids("creator", &temp_dir.path().join("nope")).await;
        assert!(ids.is_empty());
    }

    #[tokio::test]
    async fn test_unions_matching_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        fs::write(
            dir.join("creator_20240101_000000.csv"),
            "video_id,transcript\n111,a\n222,b\n",
        )
        .await
        .unwrap();
        fs::write(
            dir.join("creator_20240202_000000.csv"),
            "transcript,video_id\nc,333\nd,\n",
        )
        .await
        .unwrap();
        fs::write(dir.join("other_20240101_000000.csv"), "video_id\n999\n")
            .await
            .unwrap();
        fs::write(dir.join("creator_notes.txt"), "video_id\n888\n")
            .await
            .unwrap();

        let ids = existing_video_ids("creator", dir).await;
        let mut ids: Vec<_> = ids.into_iter().collect();
        ids.sort();
        assert_eq!(ids, vec!["111", "222", "333"]);
    }

    #[tokio::test]
    async fn test_file_without_id_column_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();

        fs::write(dir.join("creator_a.csv"), "id,transcript\n111,a\n")
            .await
            .unwrap();
        fs::write(dir.join("creator_b.csv"), "video_id\n222\n")
            .await
            .unwrap();

        let ids = existing_video_ids("creator", dir).await;
        assert_eq!(ids.len(), 1);
        assert!(ids.contains("222"));
    }

    #[test]
    fn test_partition_new() {
        let records = vec![VideoRecord::bare("1"), VideoRecord::bare("2"), VideoRecord::bare("3")];
        let existing: HashSet<String> = ["2".to_string()].into_iter().collect();

        let (new, skipped) = partition_new(records, &existing);
        assert_eq!(new.len(), 2);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].video_id, "2");
    }
}
