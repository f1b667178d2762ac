//! Native caption lookup, tried before the external service for captioned videos

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::video::{TranscriptSource, VideoRecord};

/// Source of platform-provided captions
#[async_trait]
pub trait CaptionFetcher: Send + Sync {
    /// Caption text for the video, `None` when unavailable
    async fn fetch_captions(&self, record: &VideoRecord) -> Option<String>;
}

/// Downloads the subtitle track advertised in the listing
pub struct SubtitleUrlFetcher {
    client: reqwest::Client,
}

impl SubtitleUrlFetcher {
    pub fn new(timeout_seconds: u64) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self { client })
    }

    async fn download(&self, url: &str) -> anyhow::Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl CaptionFetcher for SubtitleUrlFetcher {
    async fn fetch_captions(&self, record: &VideoRecord) -> Option<String> {
        let url = record.caption_url.as_deref()?;
        match self.download(url).await {
            Ok(body) => Some(caption_text(&body)),
            Err(e) => {
                warn!("⚠️ Error fetching captions for {}: {}", record.video_id, e);
                None
            }
        }
    }
}

/// Strip WebVTT headers, cue timings and cue numbers, joining the rest with spaces
pub fn caption_text(body: &str) -> String {
    if !body.contains("WEBVTT") {
        return body.trim().to_string();
    }

    body.lines()
        .map(str::trim)
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with("WEBVTT")
                && !line.contains("-->")
                && !line.chars().all(|c| c.is_ascii_digit())
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Try native captions for every captioned record, attaching them on success.
///
/// Returns the indexes of records that received a transcript.
pub async fn resolve_native_captions(
    fetcher: &Arc<dyn CaptionFetcher>,
    records: &mut [VideoRecord],
) -> Vec<usize> {
    let mut resolved = Vec::new();

    for (index, record) in records.iter_mut().enumerate() {
        if !record.has_captions {
            continue;
        }

        debug!("🔤 Attempting native captions for {}", record.video_id);
        let attached = match fetcher.fetch_captions(record).await {
            Some(text) => record.attach_transcript(text, TranscriptSource::NativeCaptions),
            None => false,
        };

        if attached {
            info!(
                "✅ Native captions for {} ({} chars)",
                record.video_id,
                record.transcript_len()
            );
            resolved.push(index);
        } else {
            debug!("No native captions for {}, falling back to clip service", record.video_id);
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedCaptions;

    #[async_trait]
    impl CaptionFetcher for FixedCaptions {
        async fn fetch_captions(&self, record: &VideoRecord) -> Option<String> {
            match record.video_id.as_str() {
                "with" => Some("caption text".to_string()),
                "blank" => Some("  ".to_string()),
                _ => None,
            }
        }
    }

    #[test]
    fn test_caption_text_strips_webvtt() {
        let body = "WEBVTT\n\n1\n00:00:00.000 --> 00:00:01.500\nHello there\n\n2\n00:00:01.500 --> 00:00:03.000\n  welcome back \n";
        assert_eq!(caption_text(body), "Hello there welcome back");
        assert_eq!(caption_text("  plain text \n"), "plain text");
    }

    #[tokio::test]
    async fn test_fetcher_without_url_returns_none() {
        let fetcher = SubtitleUrlFetcher::new(5).unwrap();
        let mut record = VideoRecord::bare("7300000000000000001");
        record.has_captions = true;
        assert!(fetcher.fetch_captions(&record).await.is_none());
    }

    #[tokio::test]
    async fn test_only_captioned_records_are_resolved() {
        let fetcher: Arc<dyn CaptionFetcher> = Arc::new(FixedCaptions);

        let mut with = VideoRecord::bare("with");
        with.has_captions = true;
        let mut blank = VideoRecord::bare("blank");
        blank.has_captions = true;
        let uncaptioned = VideoRecord::bare("with");

        let mut records = vec![with, blank, uncaptioned];
        let resolved = resolve_native_captions(&fetcher, &mut records).await;

        assert_eq!(resolved, vec![0]);
        assert_eq!(records[0].transcript_source, TranscriptSource::NativeCaptions);
        assert!(records[1].transcript.is_none());
        assert!(records[2].transcript.is_none());
    }
}
