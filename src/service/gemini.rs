// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/safewalk-rs

//! HTTP client for a Gemini-style generateContent endpoint

use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::prompts::{assessment_schema, ASSESSMENT_INSTRUCTIONS};
use super::{PlaceFinder, ReportGenerator, RiskAssessor, ServiceConfig, ServiceError};
use crate::assessment::RiskAssessment;
use crate::places::{extract_places, GroundingChunk, PlaceRef};
use crate::sensors::{CapturedFrame, Coordinates, SensorSnapshot};

/// Explicitly constructed service handle shared by a session
pub struct GeminiClient {
    http: reqwest::Client,
    config: ServiceConfig,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let api_key = config.resolve_api_key()?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { http, config, api_key })
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            model
        )
    }

    async fn generate_content(&self, model: &str, body: &Value) -> Result<GenerateResponse, ServiceError> {
        let url = self.endpoint(model);
        debug!("POST {}", url);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status { status: status.as_u16(), body });
        }

        Ok(response.json::<GenerateResponse>().await?)
    }
}

#[async_trait]
impl RiskAssessor for GeminiClient {
    async fn assess(&self, snapshot: &SensorSnapshot) -> Result<RiskAssessment, ServiceError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": ASSESSMENT_INSTRUCTIONS }] },
            "contents": [{ "role": "user", "parts": snapshot_parts(snapshot) }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": assessment_schema(),
            },
        });

        let response = self.generate_content(&self.config.assessment_model, &body).await?;
        let text = response.text().ok_or(ServiceError::EmptyResponse)?;
        RiskAssessment::from_json_str(&text)
    }
}

#[async_trait]
impl ReportGenerator for GeminiClient {
    async fn generate(&self, prompt: &str, frame: Option<&CapturedFrame>) -> Result<String, ServiceError> {
        let mut parts = Vec::new();
        if let Some(frame) = frame {
            parts.push(inline_part(&frame.mime_type, &frame.to_base64()));
        }
        parts.push(json!({ "text": prompt }));

        let body = json!({ "contents": [{ "role": "user", "parts": parts }] });

        let response = self.generate_content(&self.config.report_model, &body).await?;
        response.text().ok_or(ServiceError::EmptyResponse)
    }
}

#[async_trait]
impl PlaceFinder for GeminiClient {
    async fn find_places(&self, at: Coordinates, query: &str) -> Result<Vec<PlaceRef>, ServiceError> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": format!("Find {} to my location.", query) }] }],
            "tools": [{ "googleMaps": {} }],
            "toolConfig": {
                "retrievalConfig": {
                    "latLng": { "latitude": at.latitude, "longitude": at.longitude }
                }
            },
        });

        let response = self.generate_content(&self.config.places_model, &body).await?;
        let chunks = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.grounding_metadata)
            .map(|m| m.grounding_chunks)
            .unwrap_or_default();

        Ok(extract_places(&chunks))
    }
}

fn inline_part(mime_type: &str, data: &str) -> Value {
    json!({ "inlineData": { "mimeType": mime_type, "data": data } })
}

fn snapshot_parts(snapshot: &SensorSnapshot) -> Vec<Value> {
    let mut parts = Vec::new();

    if let (Some(mime), Some(data)) = (&snapshot.image_mime, &snapshot.image_base64) {
        parts.push(inline_part(mime, data));
    }
    if let (Some(mime), Some(data)) = (&snapshot.audio_mime, &snapshot.audio_base64) {
        parts.push(inline_part(mime, data));
    }

    let mut text = snapshot.location_context.clone();
    if parts.is_empty() {
        text.push_str(" No camera or microphone data is available; assess from context only.");
    }
    parts.push(json!({ "text": text }));
    parts
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"riskLevel\":"},{"text":"\"SAFE\"}"}]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(response.text().unwrap(), r#"{"riskLevel":"SAFE"}"#);
    }

    #[test]
    fn test_response_without_text() {
        let empty: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(empty.text().is_none());

        let blank: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"content":{"parts":[{"text":"  "}]}}]}"#).unwrap();
        assert!(blank.text().is_none());
    }

    #[test]
    fn test_grounding_chunks_parsed() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"Here are places"}]},
            "groundingMetadata":{"groundingChunks":[
                {"maps":{"title":"Central Police Station","uri":"https://maps.example/1"}},
                {"web":{"title":"City Hospital","uri":"https://maps.example/2"}}
            ]}}]}"#;
        let response: GenerateResponse = serde_json::from_str(raw).unwrap();
        let chunks = &response.candidates[0].grounding_metadata.as_ref().unwrap().grounding_chunks;
        let places = extract_places(chunks);
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].title, "Central Police Station");
    }

    #[test]
    fn test_snapshot_parts_context_only() {
        let snapshot = SensorSnapshot {
            image_base64: None,
            image_mime: None,
            audio_base64: None,
            audio_mime: None,
            location_context: "Location: 1.000000, 2.000000 (lat/lng).".to_string(),
        };
        let parts = snapshot_parts(&snapshot);
        assert_eq!(parts.len(), 1);
        assert!(parts[0]["text"].as_str().unwrap().contains("context only"));
    }

    #[test]
    fn test_snapshot_parts_with_media() {
        let snapshot = SensorSnapshot {
            image_base64: Some("aW1n".to_string()),
            image_mime: Some("image/jpeg".to_string()),
            audio_base64: Some("YXVk".to_string()),
            audio_mime: Some("audio/wav".to_string()),
            location_context: "ctx".to_string(),
        };
        let parts = snapshot_parts(&snapshot);
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(parts[1]["inlineData"]["data"], "YXVk");
        assert_eq!(parts[2]["text"], "ctx");
    }
}
