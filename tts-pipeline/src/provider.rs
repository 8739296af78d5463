//! Speech provider trait and types

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;

/// Tuning knobs forwarded with every synthesis request. All ratios are in
/// the 0.0–1.0 range; `speed` is a multiplier where 1.0 is normal pace.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
    pub speed: f32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.0,
            similarity_boost: 1.0,
            style: 0.0,
            use_speaker_boost: true,
            speed: 1.0,
        }
    }
}

/// A voice available from the provider.
#[derive(Debug, Clone)]
pub struct VoiceInfo {
    /// Provider-assigned identifier
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Sample audio URL, when the provider offers one
    pub preview_url: Option<String>,
}

/// Speech provider trait - the single seam to the synthesis service.
///
/// Every call is one bounded network request; implementations apply their
/// own per-call timeout and map provider failures to `TtsError::Api`.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize text with the given voice, returning encoded audio bytes.
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Vec<u8>>;

    /// Create an instant voice clone from a sample file; returns the new
    /// voice identifier.
    async fn create_voice_clone(&self, sample_path: &Path, name: &str) -> Result<String>;

    /// Delete a provider-side voice.
    async fn delete_voice(&self, voice_id: &str) -> Result<()>;

    /// List the voices available to this account.
    async fn list_voices(&self) -> Result<Vec<VoiceInfo>>;

    /// Provider name
    fn name(&self) -> &str;
}
