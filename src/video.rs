use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque project identifier handed out by the clip-processing service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which mechanism produced a record's transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptSource {
    NativeCaptions,
    ExternalService,
    #[default]
    None,
    Error,
}

impl TranscriptSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TranscriptSource::NativeCaptions => "native_captions",
            TranscriptSource::ExternalService => "external_service",
            TranscriptSource::None => "none",
            TranscriptSource::Error => "error",
        }
    }

    /// True for the sources allowed in the final record set
    pub fn is_transcribed(&self) -> bool {
        matches!(
            self,
            TranscriptSource::NativeCaptions | TranscriptSource::ExternalService
        )
    }
}

impl fmt::Display for TranscriptSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical record for one social video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRecord {
    pub video_id: String,
    pub video_url: String,
    pub author: String,
    pub description: String,
    pub hashtags: Vec<String>,
    pub view_count: u64,
    pub like_count: u64,
    pub comment_count: u64,
    pub share_count: u64,
    /// Duration in seconds
    pub duration: u64,
    pub create_time: i64,
    pub has_captions: bool,
    /// First subtitle track advertised by the listing
    #[serde(default)]
    pub caption_url: Option<String>,
    pub transcript: Option<String>,
    pub transcript_source: TranscriptSource,
    pub job_handle: Option<JobHandle>,
}

impl VideoRecord {
    /// Record carrying only an identifier, used when the listing has no item metadata
    pub fn bare(video_id: impl Into<String>) -> Self {
        let video_id = video_id.into();
        Self {
            video_url: format!("https://www.tiktok.com/video/{}", video_id),
            video_id,
            author: "unknown".to_string(),
            description: String::new(),
            hashtags: Vec::new(),
            view_count: 0,
            like_count: 0,
            comment_count: 0,
            share_count: 0,
            duration: 0,
            create_time: 0,
            has_captions: false,
            caption_url: None,
            transcript: None,
            transcript_source: TranscriptSource::None,
            job_handle: None,
        }
    }

    /// Short display title derived from the description
    pub fn title(&self) -> String {
        let trimmed = self.description.trim();
        if trimmed.is_empty() {
            "Untitled".to_string()
        } else {
            trimmed.chars().take(50).collect()
        }
    }

    pub fn attach_job_handle(&mut self, handle: JobHandle) {
        self.job_handle = Some(handle);
    }

    /// Store transcript text; whitespace-only text is rejected and leaves the record untouched
    pub fn attach_transcript(&mut self, text: String, source: TranscriptSource) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.transcript = Some(text);
        self.transcript_source = source;
        true
    }

    pub fn mark_transcript_error(&mut self) {
        self.transcript = None;
        self.transcript_source = TranscriptSource::Error;
    }

    pub fn has_transcript(&self) -> bool {
        self.transcript
            .as_deref()
            .map_or(false, |text| !text.trim().is_empty())
            && self.transcript_source.is_transcribed()
    }

    pub fn transcript_len(&self) -> usize {
        self.transcript.as_deref().map_or(0, |text| text.chars().count())
    }
}

/// Sort records by view count, highest first, keeping input order for ties
pub fn sort_by_views(records: &mut [VideoRecord]) {
    records.sort_by(|a, b| b.view_count.cmp(&a.view_count));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_record() {
        let record = VideoRecord::bare("7234567890123456789");
        assert_eq!(record.video_url, "https://www.tiktok.com/video/7234567890123456789");
        assert_eq!(record.title(), "Untitled");
        assert!(!record.has_transcript());
    }

    #[test]
    fn test_attach_transcript_rejects_blank_text() {
        let mut record = VideoRecord::bare("7234567890123456789");
        assert!(!record.attach_transcript("   ".to_string(), TranscriptSource::ExternalService));
        assert!(record.transcript.is_none());

        assert!(record.attach_transcript("hello".to_string(), TranscriptSource::ExternalService));
        assert!(record.has_transcript());
        assert_eq!(record.transcript_len(), 5);
    }

    #[test]
    fn test_sort_by_views_is_stable() {
        let mut a = VideoRecord::bare("a");
        a.view_count = 10;
        let mut b = VideoRecord::bare("b");
        b.view_count = 50;
        let mut c = VideoRecord::bare("c");
        c.view_count = 10;

        let mut records = vec![a, b, c];
        sort_by_views(&mut records);
        let ids: Vec<_> = records.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_title_truncates() {
        let mut record = VideoRecord::bare("x");
        record.description = "a".repeat(80);
        assert_eq!(record.title().chars().count(), 50);
    }
}
