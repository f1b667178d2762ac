//! Result Extractor: screenplay chapters of a finished project into transcript text

use tracing::debug;

use crate::config::TranscriptMode;
use crate::error::{FailureReason, ItemFailure};
use crate::service::{ClipService, LineKind, ScreenplayChapter};
use crate::video::JobHandle;

/// Verbal lines only, trimmed and concatenated without separators
pub fn plain_transcript(chapters: &[ScreenplayChapter]) -> String {
    chapters
        .iter()
        .flat_map(|chapter| chapter.lines.iter())
        .filter(|line| line.kind == LineKind::Verbal)
        .map(|line| line.content.trim())
        .filter(|content| !content.is_empty())
        .collect()
}

/// Trimmed verbal lines interleaved with `[Visual: ...]` markers, space-joined
pub fn enhanced_transcript(chapters: &[ScreenplayChapter]) -> String {
    let mut parts: Vec<String> = Vec::new();

    for chapter in chapters {
        if let Some(summary) = chapter
            .summary
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            parts.push(format!("[Visual: {}]", summary));
        }

        for line in &chapter.lines {
            let content = line.content.trim();
            if content.is_empty() {
                continue;
            }
            match line.kind {
                LineKind::Verbal => parts.push(content.to_string()),
                LineKind::Visual => parts.push(format!("[Visual: {}]", content)),
                LineKind::Other => {}
            }
        }
    }

    parts.join(" ")
}

/// Fetch a completed project's clips and flatten the first clip's screenplay
pub async fn extract_transcript(
    service: &dyn ClipService,
    handle: &JobHandle,
    mode: TranscriptMode,
) -> Result<String, ItemFailure> {
    let clips = service.fetch_result(handle).await.map_err(|e| {
        ItemFailure::new(
            FailureReason::ResultUnavailable,
            format!("fetching clips for {}: {}", handle, e),
        )
    })?;

    let clip = clips.into_iter().next().ok_or_else(|| {
        ItemFailure::new(
            FailureReason::ResultUnavailable,
            format!("project {} returned no exportable clips", handle),
        )
    })?;

    let chapters = clip
        .screenplay
        .map(|screenplay| screenplay.chapters)
        .filter(|chapters| !chapters.is_empty())
        .ok_or_else(|| {
            ItemFailure::new(
                FailureReason::MissingScreenplay,
                format!("first clip of {} has no screenplay chapters", handle),
            )
        })?;

    let text = match mode {
        TranscriptMode::Plain => plain_transcript(&chapters),
        TranscriptMode::Enhanced => enhanced_transcript(&chapters),
    };

    if text.trim().is_empty() {
        return Err(ItemFailure::new(
            FailureReason::EmptyTranscript,
            format!("screenplay of {} has no usable lines", handle),
        ));
    }

    debug!("📝 {} chapters -> {} chars for {}", chapters.len(), text.len(), handle);
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::service::{ExportableClip, Screenplay, ScreenplayLine, ServiceStage};
    use async_trait::async_trait;

    fn chapter() -> ScreenplayChapter {
        ScreenplayChapter {
            summary: Some("s".to_string()),
            lines: vec![
                ScreenplayLine::verbal("a"),
                ScreenplayLine::visual("b"),
                ScreenplayLine::verbal("c"),
            ],
        }
    }

    #[test]
    fn test_plain_and_enhanced_modes() {
        let chapters = vec![chapter()];
        assert_eq!(plain_transcript(&chapters), "ac");
        assert_eq!(enhanced_transcript(&chapters), "[Visual: s] a [Visual: b] c");
    }

    #[test]
    fn test_unknown_and_empty_lines_are_skipped() {
        let chapters = vec![ScreenplayChapter {
            summary: Some(String::new()),
            lines: vec![
                ScreenplayLine {
                    kind: LineKind::Other,
                    content: "music".to_string(),
                },
                ScreenplayLine::verbal("  "),
                ScreenplayLine::visual(""),
                ScreenplayLine::verbal(" hi "),
            ],
        }];
        assert_eq!(plain_transcript(&chapters), "hi");
        assert_eq!(enhanced_transcript(&chapters), "hi");
    }

    #[test]
    fn test_enhanced_mode_trims_padding() {
        let chapters = vec![ScreenplayChapter {
            summary: Some("  ".to_string()),
            lines: vec![
                ScreenplayLine::verbal("  "),
                ScreenplayLine::verbal(" hi "),
                ScreenplayLine::visual(" steam "),
            ],
        }];
        assert_eq!(enhanced_transcript(&chapters), "hi [Visual: steam]");
    }

    struct FixedResult(Vec<ExportableClip>);

    #[async_trait]
    impl ClipService for FixedResult {
        async fn submit(&self, _video_url: &str) -> Result<JobHandle, ServiceError> {
            Err(ServiceError::MissingHandle)
        }

        async fn status(&self, _handle: &JobHandle) -> Result<ServiceStage, ServiceError> {
            Ok(ServiceStage::Complete)
        }

        async fn fetch_result(
            &self,
            _handle: &JobHandle,
        ) -> Result<Vec<ExportableClip>, ServiceError> {
            Ok(self.0.clone())
        }
    }

    fn clip_with(chapters: Vec<ScreenplayChapter>) -> ExportableClip {
        ExportableClip {
            screenplay: Some(Screenplay { chapters }),
            ..ExportableClip::default()
        }
    }

    #[tokio::test]
    async fn test_extract_failure_reasons() {
        let handle = JobHandle::new("p1");

        let empty = FixedResult(Vec::new());
        let err = extract_transcript(&empty, &handle, TranscriptMode::Plain).await.unwrap_err();
        assert_eq!(err.reason, FailureReason::ResultUnavailable);

        let no_chapters = FixedResult(vec![clip_with(Vec::new())]);
        let err = extract_transcript(&no_chapters, &handle, TranscriptMode::Plain)
            .await
            .unwrap_err();
        assert_eq!(err.reason, FailureReason::MissingScreenplay);

        let visual_only = FixedResult(vec![clip_with(vec![ScreenplayChapter {
            summary: None,
            lines: vec![ScreenplayLine::visual("b")],
        }])]);
        let err = extract_transcript(&visual_only, &handle, TranscriptMode::Plain)
            .await
            .unwrap_err();
        assert_eq!(err.reason, FailureReason::EmptyTranscript);
    }

    #[tokio::test]
    async fn test_extract_uses_first_clip() {
        let service = FixedResult(vec![
            clip_with(vec![chapter()]),
            clip_with(vec![ScreenplayChapter {
                summary: None,
                lines: vec![ScreenplayLine::verbal("ignored")],
            }]),
        ]);
        let text = extract_transcript(&service, &JobHandle::new("p1"), TranscriptMode::Enhanced)
            .await
            .unwrap();
        assert_eq!(text, "[Visual: s] a [Visual: b] c");
    }
}
