use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{ClipService, ExportableClip, ServiceStage};
use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::video::JobHandle;

/// HTTP client for the OpusClip clip-project API
pub struct OpusClipClient {
    base_url: String,
    api_key: String,
    curation_model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitRequest<'a> {
    video_url: &'a str,
    curation_pref: CurationPref<'a>,
}

#[derive(Debug, Serialize)]
struct CurationPref<'a> {
    model: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    id: Option<String>,
    project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    stage: Option<String>,
}

impl OpusClipClient {
    pub fn new(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ServiceError::MissingCredentials)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            curation_model: config.curation_model.clone(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, ServiceError> {
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status, body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ClipService for OpusClipClient {
    async fn submit(&self, video_url: &str) -> Result<JobHandle, ServiceError> {
        let request = SubmitRequest {
            video_url,
            curation_pref: CurationPref {
                model: &self.curation_model,
            },
        };

        debug!("Submitting {} to clip service", video_url);

        let response = self
            .client
            .post(self.url("clip-projects"))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let body = Self::read_json(response).await?;
        let parsed: SubmitResponse =
            serde_json::from_value(body).map_err(|e| ServiceError::Decode(e.to_string()))?;

        parsed
            .project_id
            .or(parsed.id)
            .filter(|id| !id.is_empty())
            .map(JobHandle::new)
            .ok_or(ServiceError::MissingHandle)
    }

    async fn status(&self, handle: &JobHandle) -> Result<ServiceStage, ServiceError> {
        let path = format!("clip-projects/{}", urlencoding::encode(handle.as_str()));
        let response = self
            .client
            .get(self.url(&path))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let body = Self::read_json(response).await?;
        let parsed: StatusResponse =
            serde_json::from_value(body).map_err(|e| ServiceError::Decode(e.to_string()))?;

        Ok(ServiceStage::from_label(
            parsed.stage.as_deref().unwrap_or("unknown"),
        ))
    }

    async fn fetch_result(&self, handle: &JobHandle) -> Result<Vec<ExportableClip>, ServiceError> {
        let response = self
            .client
            .get(self.url("exportable-clips"))
            .bearer_auth(&self.api_key)
            .query(&[("projectId", handle.as_str())])
            .send()
            .await?;

        let body = Self::read_json(response).await?;
        parse_exportable_clips(body)
    }
}

/// The listing arrives either as `{"data": [...], "total": N}` or as a bare list
fn parse_exportable_clips(body: Value) -> Result<Vec<ExportableClip>, ServiceError> {
    let list = match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Array(_)) => data,
            _ => return Ok(Vec::new()),
        },
        list @ Value::Array(_) => list,
        _ => return Ok(Vec::new()),
    };

    serde_json::from_value(list).map_err(|e| ServiceError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_config() -> ServiceConfig {
        ServiceConfig {
            api_key: Some("secret".to_string()),
            base_url: "https://api.example.test/api/".to_string(),
            ..ServiceConfig::default()
        }
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = ServiceConfig {
            api_key: None,
            ..ServiceConfig::default()
        };
        assert!(matches!(
            OpusClipClient::new(&config),
            Err(ServiceError::MissingCredentials)
        ));
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let client = OpusClipClient::new(&test_config()).unwrap();
        assert_eq!(
            client.url("clip-projects"),
            "https://api.example.test/api/clip-projects"
        );
    }

    #[test]
    fn test_parse_exportable_clips_envelope_and_list() {
        let enveloped = json!({"data": [{"id": "c1"}, {"id": "c2"}], "total": 2});
        assert_eq!(parse_exportable_clips(enveloped).unwrap().len(), 2);

        let bare = json!([{"id": "c1"}]);
        assert_eq!(parse_exportable_clips(bare).unwrap().len(), 1);

        assert!(parse_exportable_clips(json!({"unexpected": true})).unwrap().is_empty());
    }

    #[test]
    fn test_submit_request_shape() {
        let request = SubmitRequest {
            video_url: "https://www.tiktok.com/@a/video/1",
            curation_pref: CurationPref { model: "ClipAnything" },
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "videoUrl": "https://www.tiktok.com/@a/video/1",
                "curationPref": {"model": "ClipAnything"}
            })
        );
    }
}
