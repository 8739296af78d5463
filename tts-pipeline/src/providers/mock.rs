//! Mock provider for tests and offline runs

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, VoiceInfo};

/// A scripted provider. Successful synthesis returns a fixed byte payload;
/// failures can be forced globally or for texts containing a marker
/// substring. Clone and delete calls are counted so tests can assert how
/// often the remote side was touched.
pub struct MockProvider {
    audio: Vec<u8>,
    fail_all: bool,
    fail_on_text: Option<String>,
    fail_clone: bool,
    clone_voice_id: String,
    synthesize_calls: AtomicUsize,
    clone_calls: AtomicUsize,
    deleted: Mutex<Vec<String>>,
}

impl MockProvider {
    /// Every synthesis succeeds with the given payload.
    pub fn always_succeeds(audio: &[u8]) -> Self {
        Self {
            audio: audio.to_vec(),
            fail_all: false,
            fail_on_text: None,
            fail_clone: false,
            clone_voice_id: "mock-cloned-voice".to_string(),
            synthesize_calls: AtomicUsize::new(0),
            clone_calls: AtomicUsize::new(0),
            deleted: Mutex::new(Vec::new()),
        }
    }

    /// Every provider call fails.
    pub fn always_fails() -> Self {
        let mut provider = Self::always_succeeds(b"");
        provider.fail_all = true;
        provider.fail_clone = true;
        provider
    }

    /// Synthesis fails only for texts containing `marker`.
    pub fn fails_on_text(audio: &[u8], marker: &str) -> Self {
        let mut provider = Self::always_succeeds(audio);
        provider.fail_on_text = Some(marker.to_string());
        provider
    }

    /// Make `create_voice_clone` fail while synthesis still succeeds.
    pub fn with_failing_clone(mut self) -> Self {
        self.fail_clone = true;
        self
    }

    pub fn synthesize_calls(&self) -> usize {
        self.synthesize_calls.load(Ordering::SeqCst)
    }

    pub fn clone_calls(&self) -> usize {
        self.clone_calls.load(Ordering::SeqCst)
    }

    /// Voice ids passed to `delete_voice`, in call order.
    pub fn deleted_voices(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, text: &str, _voice_id: &str) -> Result<Vec<u8>> {
        self.synthesize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_all {
            return Err(TtsError::Api {
                message: "mock synthesis failure".to_string(),
                status_code: Some(500),
            });
        }
        if let Some(marker) = &self.fail_on_text {
            if text.contains(marker.as_str()) {
                return Err(TtsError::Api {
                    message: format!("mock failure for text containing {:?}", marker),
                    status_code: Some(500),
                });
            }
        }
        Ok(self.audio.clone())
    }

    async fn create_voice_clone(&self, _sample_path: &Path, _name: &str) -> Result<String> {
        self.clone_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_clone {
            return Err(TtsError::Api {
                message: "mock clone failure".to_string(),
                status_code: Some(500),
            });
        }
        Ok(self.clone_voice_id.clone())
    }

    async fn delete_voice(&self, voice_id: &str) -> Result<()> {
        self.deleted.lock().unwrap().push(voice_id.to_string());
        Ok(())
    }

    async fn list_voices(&self) -> Result<Vec<VoiceInfo>> {
        Ok(vec![VoiceInfo {
            id: "mock-voice".to_string(),
            name: "Mock".to_string(),
            preview_url: None,
        }])
    }

    fn name(&self) -> &str {
        "Mock"
    }
}
