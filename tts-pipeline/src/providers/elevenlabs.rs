//! ElevenLabs HTTP API provider
//!
//! Covers the four calls the pipeline needs: text-to-speech, instant voice
//! clone, voice deletion, and the voice catalog. Authentication is a
//! per-request `xi-api-key` header.

use async_trait::async_trait;
use reqwest::multipart;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, VoiceInfo, VoiceSettings};

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io";

/// Fixed output profile: compressed MP3, 44.1 kHz, 128 kbps.
const OUTPUT_FORMAT: &str = "mp3_44100_128";

/// Per-call timeout; expiry surfaces as a segment-level failure upstream.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Provider backed by the ElevenLabs REST API
pub struct ElevenLabsProvider {
    base_url: String,
    api_key: String,
    model_id: String,
    settings: VoiceSettings,
    client: Client,
}

impl ElevenLabsProvider {
    pub fn new(api_key: String, model_id: &str, settings: VoiceSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TtsError::Api {
                message: format!("failed to build HTTP client: {}", e),
                status_code: None,
            })?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            model_id: model_id.to_string(),
            settings,
            client,
        })
    }

    /// Point the provider at a different host (used by tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Map a non-success response to an API error, preferring the
    /// structured message the API puts under `detail`.
    async fn error_from_response(response: reqwest::Response) -> TtsError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.detail.message)
            .unwrap_or(body);
        TtsError::Api {
            message,
            status_code: Some(status),
        }
    }
}

// API request/response types

#[derive(Debug, Serialize)]
struct SynthesisRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettingsBody,
}

#[derive(Debug, Serialize)]
struct VoiceSettingsBody {
    stability: f32,
    similarity_boost: f32,
    style: f32,
    use_speaker_boost: bool,
    speed: f32,
}

impl From<&VoiceSettings> for VoiceSettingsBody {
    fn from(s: &VoiceSettings) -> Self {
        Self {
            stability: s.stability,
            similarity_boost: s.similarity_boost,
            style: s.style,
            use_speaker_boost: s.use_speaker_boost,
            speed: s.speed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct VoiceListResponse {
    voices: Vec<VoiceEntry>,
}

#[derive(Debug, Deserialize)]
struct VoiceEntry {
    voice_id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    preview_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CloneResponse {
    voice_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>> {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);

        let body = SynthesisRequest {
            text,
            model_id: &self.model_id,
            voice_settings: (&self.settings).into(),
        };

        let response = self
            .client
            .post(&url)
            .query(&[("output_format", OUTPUT_FORMAT)])
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TtsError::Api {
                message: format!("synthesis request failed: {}", e),
                status_code: None,
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let audio = response.bytes().await.map_err(|e| TtsError::Api {
            message: format!("failed to read audio stream: {}", e),
            status_code: None,
        })?;

        Ok(audio.to_vec())
    }

    async fn create_voice_clone(&self, sample_path: &Path, name: &str) -> Result<String> {
        let url = format!("{}/v1/voices/add", self.base_url);

        let sample = tokio::fs::read(sample_path).await?;
        let file_name = sample_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample.mp3".to_string());

        let part = multipart::Part::bytes(sample)
            .file_name(file_name)
            .mime_str("audio/mpeg")
            .map_err(|e| TtsError::Api {
                message: format!("invalid sample upload: {}", e),
                status_code: None,
            })?;

        let form = multipart::Form::new()
            .text("name", name.to_string())
            .part("files", part);

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TtsError::Api {
                message: format!("voice clone request failed: {}", e),
                status_code: None,
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let clone: CloneResponse = response.json().await.map_err(|e| TtsError::Api {
            message: format!("failed to parse clone response: {}", e),
            status_code: None,
        })?;

        Ok(clone.voice_id)
    }

    async fn delete_voice(&self, voice_id: &str) -> Result<()> {
        let url = format!("{}/v1/voices/{}", self.base_url, voice_id);

        let response = self
            .client
            .delete(&url)
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| TtsError::Api {
                message: format!("voice delete request failed: {}", e),
                status_code: None,
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        Ok(())
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        let url = format!("{}/v1/voices", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| TtsError::Api {
                message: format!("voice list request failed: {}", e),
                status_code: None,
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let list: VoiceListResponse = response.json().await.map_err(|e| TtsError::Api {
            message: format!("failed to parse voice list: {}", e),
            status_code: None,
        })?;

        Ok(list
            .voices
            .into_iter()
            .map(|v| VoiceInfo {
                name: v.name.unwrap_or_else(|| v.voice_id.clone()),
                id: v.voice_id,
                preview_url: v.preview_url,
            })
            .collect())
    }

    fn name(&self) -> &str {
        "ElevenLabs"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_body_mirrors_settings() {
        let settings = VoiceSettings {
            stability: 0.3,
            similarity_boost: 0.9,
            style: 0.1,
            use_speaker_boost: false,
            speed: 1.2,
        };
        let body = VoiceSettingsBody::from(&settings);
        assert_eq!(body.stability, 0.3);
        assert_eq!(body.similarity_boost, 0.9);
        assert_eq!(body.style, 0.1);
        assert!(!body.use_speaker_boost);
        assert_eq!(body.speed, 1.2);
    }

    #[test]
    fn test_error_body_parsing() {
        let body = r#"{"detail":{"status":"invalid_api_key","message":"Invalid API key"}}"#;
        let parsed: ErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.detail.message, "Invalid API key");
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let provider = ElevenLabsProvider::new(
            "key".to_string(),
            "eleven_multilingual_v2",
            VoiceSettings::default(),
        )
        .unwrap()
        .with_base_url("http://localhost:9999/");
        assert_eq!(provider.base_url, "http://localhost:9999");
    }
}
