//! Configuration management
//!
//! Settings live in a TOML file; secrets never do. The provider API key
//! and the optional store key are resolved from environment variables
//! named in the config.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::{Result, TtsError};
use crate::provider::VoiceSettings;
use crate::providers::ElevenLabsProvider;
use crate::quota::QuotaLimits;
use crate::session::Pipeline;
use crate::store::{MemoryStore, RestStore, UsageStore};

const DEFAULT_MODEL: &str = "eleven_multilingual_v2";
const DEFAULT_API_KEY_ENV: &str = "ELEVENLABS_API_KEY";
const DEFAULT_STORE_KEY_ENV: &str = "SUPABASE_ANON_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoicecastConfig {
    /// User the quota counters are kept under
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Provider model identifier
    #[serde(default = "default_model")]
    pub model_id: String,

    /// Environment variable holding the provider API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Where generated clips and artifacts land
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Where uploaded voice samples are kept
    #[serde(default = "default_samples_dir")]
    pub samples_dir: PathBuf,

    /// Cloned-voice cap per user
    #[serde(default = "default_max_voices")]
    pub max_voices: usize,

    /// Generation cap per user
    #[serde(default = "default_max_generations")]
    pub max_generations: usize,

    /// Base URL of the usage store; when unset, counts are in-process only
    #[serde(default)]
    pub store_url: Option<String>,

    /// Environment variable holding the store API key
    #[serde(default = "default_store_key_env")]
    pub store_key_env: String,

    /// Synthesis tuning forwarded with every request
    #[serde(default)]
    pub voice: VoiceTuning,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceTuning {
    #[serde(default = "default_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
    #[serde(default = "default_style")]
    pub style: f32,
    #[serde(default = "default_speaker_boost")]
    pub use_speaker_boost: bool,
    #[serde(default = "default_speed")]
    pub speed: f32,
}

fn default_user_id() -> String {
    "local".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("outputs/tts")
}

fn default_samples_dir() -> PathBuf {
    PathBuf::from("data/voicesamples")
}

fn default_max_voices() -> usize {
    1
}

fn default_max_generations() -> usize {
    5
}

fn default_store_key_env() -> String {
    DEFAULT_STORE_KEY_ENV.to_string()
}

fn default_stability() -> f32 {
    0.0
}

fn default_similarity_boost() -> f32 {
    1.0
}

fn default_style() -> f32 {
    0.0
}

fn default_speaker_boost() -> bool {
    true
}

fn default_speed() -> f32 {
    1.0
}

impl Default for VoiceTuning {
    fn default() -> Self {
        Self {
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            style: default_style(),
            use_speaker_boost: default_speaker_boost(),
            speed: default_speed(),
        }
    }
}

impl Default for VoicecastConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            model_id: default_model(),
            api_key_env: default_api_key_env(),
            output_dir: default_output_dir(),
            samples_dir: default_samples_dir(),
            max_voices: default_max_voices(),
            max_generations: default_max_generations(),
            store_url: None,
            store_key_env: default_store_key_env(),
            voice: VoiceTuning::default(),
        }
    }
}

impl VoiceTuning {
    pub fn to_settings(&self) -> VoiceSettings {
        VoiceSettings {
            stability: self.stability,
            similarity_boost: self.similarity_boost,
            style: self.style,
            use_speaker_boost: self.use_speaker_boost,
            speed: self.speed,
        }
    }
}

impl VoicecastConfig {
    /// Get the config file path: ~/.config/voicecast/voicecast.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| TtsError::Config("could not determine home directory".to_string()))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("voicecast")
            .join("voicecast.toml"))
    }

    /// Load config from file, returning defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: VoicecastConfig =
            toml::from_str(&content).map_err(|e| TtsError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| TtsError::Config(e.to_string()))?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Resolve the provider API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env).map_err(|_| TtsError::MissingApiKey {
            env_var: self.api_key_env.clone(),
        })
    }

    pub fn limits(&self) -> QuotaLimits {
        QuotaLimits {
            max_voices: self.max_voices,
            max_generations: self.max_generations,
        }
    }

    /// Wire up a pipeline from this config: ElevenLabs provider, plus the
    /// REST store when one is configured or an in-process store otherwise.
    pub fn build_pipeline(&self) -> Result<Pipeline> {
        let api_key = self.api_key()?;
        let provider =
            ElevenLabsProvider::new(api_key, &self.model_id, self.voice.to_settings())?;

        let store: Box<dyn UsageStore> = match &self.store_url {
            Some(url) => {
                let key =
                    std::env::var(&self.store_key_env).map_err(|_| TtsError::MissingApiKey {
                        env_var: self.store_key_env.clone(),
                    })?;
                Box::new(RestStore::new(url, key)?)
            }
            None => {
                log::warn!("no usage store configured; quota counters reset every run");
                Box::new(MemoryStore::new())
            }
        };

        Ok(Pipeline::new(
            Box::new(provider),
            store,
            self.limits(),
            &self.output_dir,
            &self.samples_dir,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = VoicecastConfig::default();
        assert_eq!(config.model_id, "eleven_multilingual_v2");
        assert_eq!(config.max_voices, 1);
        assert_eq!(config.max_generations, 5);
        assert!(config.store_url.is_none());
        assert_eq!(config.voice.similarity_boost, 1.0);
        assert!(config.voice.use_speaker_boost);
    }

    #[test]
    fn test_config_path() {
        let path = VoicecastConfig::config_path();
        assert!(path.is_ok());
        let path = path.unwrap();
        assert!(path.ends_with("voicecast/voicecast.toml"));
    }

    #[test]
    fn test_parse_config() {
        let toml_str = r#"
user_id = "alice"
model_id = "eleven_turbo_v2"
max_generations = 10
store_url = "https://db.example.com"

[voice]
stability = 0.5
speed = 1.1
"#;
        let config: VoicecastConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.user_id, "alice");
        assert_eq!(config.model_id, "eleven_turbo_v2");
        assert_eq!(config.max_generations, 10);
        assert_eq!(config.store_url.as_deref(), Some("https://db.example.com"));
        assert_eq!(config.voice.stability, 0.5);
        assert_eq!(config.voice.speed, 1.1);
        // Untouched fields keep their defaults.
        assert_eq!(config.max_voices, 1);
        assert_eq!(config.voice.similarity_boost, 1.0);
    }

    #[test]
    fn test_parse_empty_config() {
        let toml_str = "";
        let config: VoicecastConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.user_id, "local");
        assert_eq!(config.max_generations, 5);
    }
}
