//! Record Normalizer
//!
//! Turns a raw listing document of arbitrary shape into canonical [`VideoRecord`]s,
//! deduplicated by identifier and ordered by view count.

use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::video::{sort_by_views, VideoRecord};

/// Keys that may hold the item list, searched at any depth
const ITEM_LIST_KEYS: &[&str] = &["itemList", "videos", "items"];

/// Keys treated as identifiers when falling back to bare id extraction
const ID_KEYS: &[&str] = &["id", "video_id", "videoId", "aweme_id"];

/// Identifiers in this domain are long numeric strings (typically 19 digits)
const MIN_BARE_ID_LEN: usize = 15;

/// Parse, deduplicate and sort every video found in `document`
pub fn normalize_document(document: &Value) -> Vec<VideoRecord> {
    let parsed = match find_item_list(document) {
        Some(items) => {
            debug!("🔍 Found item list with {} entries", items.len());
            items.iter().filter_map(parse_item).collect::<Vec<_>>()
        }
        None => {
            warn!("⚠️ Could not find an item list in document, falling back to id extraction");
            extract_video_ids(document)
                .into_iter()
                .map(VideoRecord::bare)
                .collect()
        }
    };

    let total = parsed.len();
    let mut records = dedup_by_id(parsed);
    sort_by_views(&mut records);

    info!("✅ Found {} videos, {} unique", total, records.len());
    records
}

/// Channel name from a listing file path, e.g. `input/reidhoffman.json` -> `reidhoffman`
pub fn channel_name_from_path(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Depth-first search for the first list of items
fn find_item_list(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) if items.iter().any(Value::is_object) && looks_like_items(items) => {
            Some(items)
        }
        Value::Object(map) => {
            for key in ITEM_LIST_KEYS {
                if let Some(Value::Array(items)) = map.get(*key) {
                    if !items.is_empty() {
                        return Some(items);
                    }
                }
            }
            map.values().find_map(find_item_list)
        }
        Value::Array(items) => items.iter().find_map(find_item_list),
        _ => None,
    }
}

/// A bare array only counts as an item list when its objects carry an identifier
fn looks_like_items(items: &[Value]) -> bool {
    items
        .iter()
        .filter_map(Value::as_object)
        .any(|item| item_id(item).is_some())
}

fn parse_item(item: &Value) -> Option<VideoRecord> {
    let Some(map) = item.as_object() else {
        warn!("⚠️ Skipping non-object entry in item list");
        return None;
    };

    let Some(video_id) = item_id(map) else {
        warn!("⚠️ Skipping item without an identifier");
        return None;
    };

    let author = match map.get("author") {
        Some(Value::Object(author)) => author
            .get("uniqueId")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string(),
        Some(Value::String(name)) if !name.is_empty() => name.clone(),
        _ => "unknown".to_string(),
    };

    let first_content = map
        .get("contents")
        .and_then(Value::as_array)
        .and_then(|contents| contents.first())
        .and_then(Value::as_object);

    let mut description = string_field(map, "desc")
        .or_else(|| string_field(map, "description"))
        .unwrap_or_default();
    let mut text_extra = map.get("textExtra");

    if let Some(content) = first_content {
        if let Some(desc) = string_field(content, "desc") {
            description = desc;
        }
        if let Some(extra) = content.get("textExtra") {
            text_extra = Some(extra);
        }
    }

    let mut hashtags = Vec::new();
    if let Some(Value::Array(challenges)) = map.get("challenges") {
        for challenge in challenges {
            if let Some(title) = challenge.get("title").and_then(Value::as_str) {
                push_unique(&mut hashtags, title);
            }
        }
    }
    if let Some(Value::Array(extras)) = text_extra {
        for extra in extras {
            if let Some(name) = extra.get("hashtagName").and_then(Value::as_str) {
                push_unique(&mut hashtags, name);
            }
        }
    }

    let stats = map.get("stats").and_then(Value::as_object);
    let counter = |key: &str| stats.and_then(|s| s.get(key)).map_or(0, as_count);

    let video = map.get("video").and_then(Value::as_object);
    let duration = video.and_then(|v| v.get("duration")).map_or(0, as_count);
    let has_captions = video
        .and_then(|v| v.get("subtitleInfos"))
        .map_or(false, |infos| match infos {
            Value::Array(list) => !list.is_empty(),
            Value::Null => false,
            Value::Object(obj) => !obj.is_empty(),
            _ => true,
        });

    let caption_url = video
        .and_then(|v| v.get("subtitleInfos"))
        .and_then(Value::as_array)
        .and_then(|infos| infos.first())
        .and_then(subtitle_url);

    Some(VideoRecord {
        video_url: format!("https://www.tiktok.com/@{}/video/{}", author, video_id),
        video_id,
        author,
        description,
        hashtags,
        view_count: counter("playCount"),
        like_count: counter("diggCount"),
        comment_count: counter("commentCount"),
        share_count: counter("shareCount"),
        duration,
        create_time: map.get("createTime").map_or(0, as_count) as i64,
        has_captions,
        caption_url,
        transcript: None,
        transcript_source: Default::default(),
        job_handle: None,
    })
}

/// Subtitle entries carry either `Url`/`url` or a `UrlList`
fn subtitle_url(info: &Value) -> Option<String> {
    ["Url", "url"]
        .iter()
        .find_map(|key| info.get(*key).and_then(Value::as_str))
        .or_else(|| {
            info.get("UrlList")
                .and_then(Value::as_array)
                .and_then(|urls| urls.first())
                .and_then(Value::as_str)
        })
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

fn item_id(map: &Map<String, Value>) -> Option<String> {
    map.get("id")
        .and_then(scalar_to_string)
        .or_else(|| {
            map.get("video")
                .and_then(|video| video.get("id"))
                .and_then(scalar_to_string)
        })
        .filter(|id| !id.is_empty())
}

fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Counters arrive either as numbers or as numeric strings
fn as_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn push_unique(tags: &mut Vec<String>, tag: &str) {
    let tag = tag.trim();
    if !tag.is_empty() && !tags.iter().any(|existing| existing == tag) {
        tags.push(tag.to_string());
    }
}

/// Recursively collect every id-like value long enough to be a video identifier
pub fn extract_video_ids(document: &Value) -> Vec<String> {
    fn walk(value: &Value, ids: &mut BTreeSet<String>) {
        match value {
            Value::Object(map) => {
                for key in ID_KEYS {
                    if let Some(id) = map.get(*key).and_then(scalar_to_string) {
                        if id.len() >= MIN_BARE_ID_LEN {
                            ids.insert(id);
                        }
                    }
                }
                for child in map.values() {
                    walk(child, ids);
                }
            }
            Value::Array(items) => {
                for item in items {
                    walk(item, ids);
                }
            }
            _ => {}
        }
    }

    let mut ids = BTreeSet::new();
    walk(document, &mut ids);
    ids.into_iter().collect()
}

fn dedup_by_id(records: Vec<VideoRecord>) -> Vec<VideoRecord> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| seen.insert(record.video_id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_document() -> Value {
        json!({
            "itemList": [
                {
                    "id": "7234567890123456789",
                    "author": {"uniqueId": "testuser"},
                    "desc": "Test video description #test #viral",
                    "stats": {"playCount": 1500000, "diggCount": 150000, "commentCount": 5000, "shareCount": 2000},
                    "video": {"duration": 15, "subtitleInfos": []},
                    "challenges": [{"title": "viral"}],
                    "textExtra": [
                        {"hashtagName": "test", "name": "test"},
                        {"hashtagName": "viral", "name": "viral"}
                    ]
                },
                {
                    "id": 7234567890123456790u64,
                    "author": {"uniqueId": "testuser"},
                    "desc": "Another test video",
                    "stats": {"playCount": "2000000"},
                    "video": {"duration": 30, "subtitleInfos": [{"url": "test.vtt"}]},
                    "textExtra": []
                },
                {
                    "id": "7234567890123456789",
                    "desc": "duplicate with more views",
                    "stats": {"playCount": 9000000}
                }
            ]
        })
    }

    #[test]
    fn test_parses_item_list() {
        let records = normalize_document(&sample_document());
        assert_eq!(records.len(), 2);

        let top = &records[0];
        assert_eq!(top.video_id, "7234567890123456790");
        assert_eq!(top.view_count, 2_000_000);
        assert_eq!(top.like_count, 0);
        assert!(top.has_captions);
        assert_eq!(top.caption_url.as_deref(), Some("test.vtt"));
        assert_eq!(top.duration, 30);

        let second = &records[1];
        assert_eq!(second.description, "Test video description #test #viral");
        assert_eq!(second.hashtags, vec!["viral", "test"]);
        assert_eq!(
            second.video_url,
            "https://www.tiktok.com/@testuser/video/7234567890123456789"
        );
        assert!(!second.has_captions);
        assert!(second.caption_url.is_none());
    }

    #[test]
    fn test_first_occurrence_wins() {
        let records = normalize_document(&sample_document());
        let dup = records
            .iter()
            .find(|r| r.video_id == "7234567890123456789")
            .unwrap();
        assert_eq!(dup.view_count, 1_500_000);
    }

    #[test]
    fn test_nested_envelope_and_contents_override() {
        let document = json!({
            "data": {
                "payload": {
                    "itemList": [{
                        "id": "7000000000000000001",
                        "desc": "outer",
                        "textExtra": [{"hashtagName": "outer"}],
                        "contents": [{"desc": "inner", "textExtra": [{"hashtagName": "inner"}]}]
                    }]
                }
            }
        });
        let records = normalize_document(&document);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "inner");
        assert_eq!(records[0].hashtags, vec!["inner"]);
        assert_eq!(records[0].author, "unknown");
    }

    #[test]
    fn test_flat_list() {
        let document = json!([
            {"id": "7000000000000000001", "stats": {"playCount": 1}},
            {"id": "7000000000000000002", "stats": {"playCount": 3}}
        ]);
        let records = normalize_document(&document);
        let ids: Vec<_> = records.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(ids, vec!["7000000000000000002", "7000000000000000001"]);
    }

    #[test]
    fn test_fallback_id_extraction() {
        let document = json!({
            "meta": {"id": "short"},
            "nested": [{"video_id": "7111111111111111111"}, {"deep": {"id": 7222222222222222222u64}}]
        });
        let records = normalize_document(&document);
        let ids: Vec<_> = records.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(ids, vec!["7111111111111111111", "7222222222222222222"]);
        assert_eq!(records[0].video_url, "https://www.tiktok.com/video/7111111111111111111");
    }

    #[test]
    fn test_empty_document_yields_nothing() {
        assert!(normalize_document(&json!({})).is_empty());
        assert!(normalize_document(&json!({"itemList": []})).is_empty());
    }

    #[test]
    fn test_channel_name_from_path() {
        assert_eq!(
            channel_name_from_path(Path::new("input/reidhoffman.json")),
            "reidhoffman"
        );
        assert_eq!(channel_name_from_path(Path::new("creator.json")), "creator");
    }
}
