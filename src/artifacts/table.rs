use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::video::VideoRecord;

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    video_id: &'a str,
    video_url: &'a str,
    transcript: &'a str,
    description: &'a str,
    hashtags: String,
    view_count: u64,
    like_count: u64,
    comment_count: u64,
    share_count: u64,
    duration: u64,
    transcript_source: &'static str,
}

impl<'a> From<&'a VideoRecord> for CsvRow<'a> {
    fn from(record: &'a VideoRecord) -> Self {
        Self {
            video_id: &record.video_id,
            video_url: &record.video_url,
            transcript: record.transcript.as_deref().unwrap_or_default(),
            description: &record.description,
            hashtags: record.hashtags.join(", "),
            view_count: record.view_count,
            like_count: record.like_count,
            comment_count: record.comment_count,
            share_count: record.share_count,
            duration: record.duration,
            transcript_source: record.transcript_source.as_str(),
        }
    }
}

/// Render records as CSV with a header row
pub fn render_csv(records: &[VideoRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV buffer: {}", e))
}

pub async fn write_csv(path: &Path, records: &[VideoRecord]) -> Result<()> {
    let bytes = render_csv(records)?;
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::TranscriptSource;

    #[test]
    fn test_render_csv_columns_and_quoting() {
        let mut record = VideoRecord::bare("7300000000000000001");
        record.description = "Hello, \"world\"".to_string();
        record.hashtags = vec!["fyp".to_string(), "cooking".to_string()];
        record.view_count = 42;
        record.attach_transcript("line one".to_string(), TranscriptSource::ExternalService);

        let text = String::from_utf8(render_csv(&[record]).unwrap()).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "video_id,video_url,transcript,description,hashtags,view_count,like_count,\
             comment_count,share_count,duration,transcript_source"
        );
        assert_eq!(
            lines.next().unwrap(),
            "7300000000000000001,https://www.tiktok.com/video/7300000000000000001,line one,\
             \"Hello, \"\"world\"\"\",\"fyp, cooking\",42,0,0,0,0,external_service"
        );
    }
}
