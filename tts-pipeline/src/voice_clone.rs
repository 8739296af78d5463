//! Instant voice cloning
//!
//! One voice per user: the quota gate runs before anything touches the
//! provider. A created provider-side voice whose record cannot be saved is
//! deleted again (best effort) so nothing orphaned counts as success.

use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::{Result, TtsError};
use crate::provider::SpeechProvider;
use crate::quota::{DenyReason, QuotaDecision, QuotaGuard};
use crate::store::{UsageStore, VoiceRecord};

/// How a clone attempt ended.
#[derive(Debug, Clone, PartialEq)]
pub enum CloneOutcome {
    /// The provider created the voice and the record was saved.
    Created { voice_id: String },
    /// The quota gate refused; the provider was never contacted.
    Denied(DenyReason),
    /// Something downstream failed; any provider-side voice was rolled back.
    Failed { reason: String },
}

impl fmt::Display for CloneOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloneOutcome::Created { voice_id } => write!(f, "created voice {}", voice_id),
            CloneOutcome::Denied(reason) => write!(f, "denied: {}", reason),
            CloneOutcome::Failed { reason } => write!(f, "failed: {}", reason),
        }
    }
}

pub struct VoiceCloneCoordinator<'a> {
    provider: &'a dyn SpeechProvider,
    store: &'a dyn UsageStore,
    guard: &'a QuotaGuard,
    samples_root: &'a Path,
}

impl<'a> VoiceCloneCoordinator<'a> {
    pub fn new(
        provider: &'a dyn SpeechProvider,
        store: &'a dyn UsageStore,
        guard: &'a QuotaGuard,
        samples_root: &'a Path,
    ) -> Self {
        Self {
            provider,
            store,
            guard,
            samples_root,
        }
    }

    /// Clone a voice from an uploaded sample. `requested_name` may be
    /// blank, in which case a generated name is used.
    pub async fn clone_voice(
        &self,
        user_id: &str,
        sample: &Path,
        requested_name: &str,
    ) -> CloneOutcome {
        let current = match self.store.voice_count(user_id).await {
            Ok(count) => count,
            Err(e) => {
                log::warn!("could not read voice count for {}: {}", user_id, e);
                0
            }
        };
        if let QuotaDecision::Deny(reason) = self.guard.check_voice(current) {
            return CloneOutcome::Denied(reason);
        }

        let stored_sample = match self.save_sample(sample).await {
            Ok(path) => path,
            Err(e) => {
                return CloneOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let name = effective_name(requested_name);

        let voice_id = match self
            .provider
            .create_voice_clone(&stored_sample, &name)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                return CloneOutcome::Failed {
                    reason: format!("provider could not create voice: {}", e),
                }
            }
        };
        log::info!("provider created voice {} ({})", voice_id, name);

        let record = VoiceRecord {
            user_id: user_id.to_string(),
            voice_id: voice_id.clone(),
            voice_name: name,
            created_at: Utc::now(),
        };

        if let Err(e) = self.store.insert_voice(&record).await {
            // Roll back the provider-side voice so it cannot linger
            // unaccounted. The compensation itself is best effort.
            log::warn!(
                "could not save voice record, deleting provider voice {}: {}",
                voice_id,
                e
            );
            if let Err(del) = self.provider.delete_voice(&voice_id).await {
                log::warn!("compensating delete of voice {} failed: {}", voice_id, del);
            }
            return CloneOutcome::Failed {
                reason: format!("could not save voice record: {}", e),
            };
        }

        CloneOutcome::Created { voice_id }
    }

    /// Copy the uploaded sample into the samples root under a
    /// collision-resistant name, keeping the original basename visible.
    async fn save_sample(&self, sample: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(self.samples_root)
            .await
            .map_err(|e| TtsError::Upload(format!("could not create samples directory: {}", e)))?;

        let basename = sample
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "sample".to_string());
        let dest = self
            .samples_root
            .join(format!("{}_{}", Uuid::new_v4().simple(), basename));

        tokio::fs::copy(sample, &dest)
            .await
            .map_err(|e| TtsError::Upload(format!("could not save sample: {}", e)))?;

        Ok(dest)
    }
}

fn effective_name(requested: &str) -> String {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        let token = Uuid::new_v4().simple().to_string();
        format!("cloned_{}", &token[..6])
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use crate::quota::QuotaLimits;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use tempfile::TempDir;

    fn existing_voice(user: &str) -> VoiceRecord {
        VoiceRecord {
            user_id: user.to_string(),
            voice_id: "existing".to_string(),
            voice_name: "Existing".to_string(),
            created_at: Utc::now(),
        }
    }

    fn sample_file(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("sample.mp3");
        std::fs::write(&path, b"sample-bytes").unwrap();
        path
    }

    #[tokio::test]
    async fn test_successful_clone() {
        let provider = MockProvider::always_succeeds(b"");
        let store = MemoryStore::new();
        let guard = QuotaGuard::new(QuotaLimits::default());
        let dir = TempDir::new().unwrap();
        let samples = dir.path().join("samples");
        let coordinator = VoiceCloneCoordinator::new(&provider, &store, &guard, &samples);

        let outcome = coordinator
            .clone_voice("alice", &sample_file(&dir), "My Voice")
            .await;

        assert_eq!(
            outcome,
            CloneOutcome::Created {
                voice_id: "mock-cloned-voice".to_string()
            }
        );
        let records = store.list_voices("alice").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].voice_name, "My Voice");
    }

    #[tokio::test]
    async fn test_denied_makes_no_provider_call() {
        let provider = MockProvider::always_succeeds(b"");
        let store = MemoryStore::new();
        store.insert_voice(&existing_voice("alice")).await.unwrap();
        let guard = QuotaGuard::new(QuotaLimits::default());
        let dir = TempDir::new().unwrap();
        let samples = dir.path().join("samples");
        let coordinator = VoiceCloneCoordinator::new(&provider, &store, &guard, &samples);

        let outcome = coordinator
            .clone_voice("alice", &sample_file(&dir), "Second Voice")
            .await;

        assert!(matches!(outcome, CloneOutcome::Denied(_)));
        assert_eq!(provider.clone_calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_sample_never_contacts_provider() {
        let provider = MockProvider::always_succeeds(b"");
        let store = MemoryStore::new();
        let guard = QuotaGuard::new(QuotaLimits::default());
        let dir = TempDir::new().unwrap();
        let samples = dir.path().join("samples");
        let coordinator = VoiceCloneCoordinator::new(&provider, &store, &guard, &samples);

        let outcome = coordinator
            .clone_voice("alice", Path::new("/nonexistent/sample.mp3"), "Voice")
            .await;

        assert!(matches!(outcome, CloneOutcome::Failed { .. }));
        assert_eq!(provider.clone_calls(), 0);
    }

    #[tokio::test]
    async fn test_record_failure_triggers_compensating_delete() {
        let provider = MockProvider::always_succeeds(b"");
        let store = MemoryStore::new();
        store.set_fail_inserts(true);
        let guard = QuotaGuard::new(QuotaLimits::default());
        let dir = TempDir::new().unwrap();
        let samples = dir.path().join("samples");
        let coordinator = VoiceCloneCoordinator::new(&provider, &store, &guard, &samples);

        let outcome = coordinator
            .clone_voice("alice", &sample_file(&dir), "Voice")
            .await;

        assert!(matches!(outcome, CloneOutcome::Failed { .. }));
        assert_eq!(provider.clone_calls(), 1);
        // Exactly one rollback, naming the voice the provider just created.
        assert_eq!(
            provider.deleted_voices(),
            vec!["mock-cloned-voice".to_string()]
        );
    }

    #[tokio::test]
    async fn test_provider_failure_is_reported() {
        let provider = MockProvider::always_succeeds(b"").with_failing_clone();
        let store = MemoryStore::new();
        let guard = QuotaGuard::new(QuotaLimits::default());
        let dir = TempDir::new().unwrap();
        let samples = dir.path().join("samples");
        let coordinator = VoiceCloneCoordinator::new(&provider, &store, &guard, &samples);

        let outcome = coordinator
            .clone_voice("alice", &sample_file(&dir), "Voice")
            .await;

        assert!(matches!(outcome, CloneOutcome::Failed { .. }));
        // Nothing to roll back: no voice was created.
        assert!(provider.deleted_voices().is_empty());
        assert!(store.list_voices("alice").await.unwrap().is_empty());
    }

    #[test]
    fn test_effective_name() {
        assert_eq!(effective_name("  Rachel  "), "Rachel");
        let generated = effective_name("   ");
        assert!(generated.starts_with("cloned_"));
        assert_eq!(generated.len(), "cloned_".len() + 6);
    }

    #[tokio::test]
    async fn test_sample_stored_under_generated_name() {
        let provider = MockProvider::always_succeeds(b"");
        let store = MemoryStore::new();
        let guard = QuotaGuard::new(QuotaLimits::default());
        let dir = TempDir::new().unwrap();
        let samples = dir.path().join("samples");
        let coordinator = VoiceCloneCoordinator::new(&provider, &store, &guard, &samples);

        coordinator
            .clone_voice("alice", &sample_file(&dir), "Voice")
            .await;

        let stored: Vec<_> = std::fs::read_dir(&samples)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(stored.len(), 1);
        // Prefixed with a token, original basename preserved.
        assert!(stored[0].ends_with("_sample.mp3"));
        assert_ne!(stored[0], "sample.mp3");
    }
}
