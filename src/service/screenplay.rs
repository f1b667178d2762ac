//! Structured transcript payload returned for exportable clips

use serde::{Deserialize, Serialize};

/// One exportable clip of a completed project
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportableClip {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub screenplay: Option<Screenplay>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Screenplay {
    #[serde(default)]
    pub chapters: Vec<ScreenplayChapter>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenplayChapter {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub lines: Vec<ScreenplayLine>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenplayLine {
    #[serde(rename = "type", default)]
    pub kind: LineKind,
    #[serde(default)]
    pub content: String,
}

impl ScreenplayLine {
    pub fn verbal(content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Verbal,
            content: content.into(),
        }
    }

    pub fn visual(content: impl Into<String>) -> Self {
        Self {
            kind: LineKind::Visual,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Verbal,
    Visual,
    #[default]
    #[serde(other)]
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserializes_service_payload() {
        let payload = serde_json::json!({
            "id": "clip1",
            "title": "Hook",
            "durationMs": 15300,
            "screenplay": {
                "chapters": [{
                    "summary": "A kitchen",
                    "lines": [
                        {"type": "verbal", "content": "hello"},
                        {"type": "visual", "content": "steam rises"},
                        {"type": "music", "content": "beat"}
                    ]
                }]
            }
        });

        let clip: ExportableClip = serde_json::from_value(payload).unwrap();
        let screenplay = clip.screenplay.unwrap();
        let lines = &screenplay.chapters[0].lines;
        assert_eq!(lines[0].kind, LineKind::Verbal);
        assert_eq!(lines[1].kind, LineKind::Visual);
        assert_eq!(lines[2].kind, LineKind::Other);
        assert_eq!(clip.duration_ms, Some(15300.0));
    }
}
