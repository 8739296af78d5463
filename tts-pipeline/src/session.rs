//! Session context and the pipeline facade
//!
//! A `Session` is the explicit state one user edits against: their script,
//! the cached voice catalog, and the clips from the last batch. The
//! `Pipeline` owns the collaborators and exposes every operation the
//! presentation layer needs, so there is exactly one generation path no
//! matter which options are enabled.

use std::path::{Path, PathBuf};

use crate::assemble::{Artifact, AudioAssembler};
use crate::batch::{BatchOutcome, BatchSynthesizer};
use crate::error::{Result, TtsError};
use crate::provider::{SpeechProvider, VoiceInfo};
use crate::quota::{QuotaDecision, QuotaGuard, QuotaKind, QuotaLimits};
use crate::segment::Script;
use crate::store::{GenerationRecord, UsageStore, VoiceRecord};
use crate::voice_clone::{CloneOutcome, VoiceCloneCoordinator};

/// Everything one editing session owns. Constructed per user, passed
/// explicitly into each pipeline call.
#[derive(Debug)]
pub struct Session {
    user_id: String,
    pub script: Script,
    voices: Vec<VoiceInfo>,
    last_clips: Vec<PathBuf>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            script: Script::new(),
            voices: Vec::new(),
            last_clips: Vec::new(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Cached provider voice catalog; refreshed via `Pipeline::refresh_voices`.
    pub fn voices(&self) -> &[VoiceInfo] {
        &self.voices
    }

    /// Clip files produced by the most recent batch, in script order.
    pub fn last_clips(&self) -> &[PathBuf] {
        &self.last_clips
    }

    /// Find a cached voice by display name (case-insensitive).
    pub fn voice_by_name(&self, name: &str) -> Option<&VoiceInfo> {
        self.voices
            .iter()
            .find(|v| v.name.eq_ignore_ascii_case(name))
    }
}

/// Which assembly step runs after a successful batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assembly {
    /// Keep the per-segment clips as they are.
    Individual,
    /// Concatenate into one file, falling back to an archive on failure.
    Merge,
    /// Package the clips into an archive without attempting a merge.
    Zip,
}

/// What a generation run produced.
#[derive(Debug)]
pub struct GenerateReport {
    pub outcome: BatchOutcome,
    pub artifact: Option<Artifact>,
}

/// Usage counters for display.
#[derive(Debug, Clone, Copy)]
pub struct UsageSummary {
    pub voices_used: usize,
    pub generations_used: usize,
    pub limits: QuotaLimits,
}

impl UsageSummary {
    pub fn voices_remaining(&self) -> usize {
        self.limits.max_voices.saturating_sub(self.voices_used)
    }

    pub fn generations_remaining(&self) -> usize {
        self.limits
            .max_generations
            .saturating_sub(self.generations_used)
    }
}

pub struct Pipeline {
    provider: Box<dyn SpeechProvider>,
    store: Box<dyn UsageStore>,
    guard: QuotaGuard,
    output_root: PathBuf,
    samples_root: PathBuf,
}

impl Pipeline {
    pub fn new(
        provider: Box<dyn SpeechProvider>,
        store: Box<dyn UsageStore>,
        limits: QuotaLimits,
        output_root: impl Into<PathBuf>,
        samples_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            store,
            guard: QuotaGuard::new(limits),
            output_root: output_root.into(),
            samples_root: samples_root.into(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Validate, enforce the generation quota, synthesize every segment,
    /// then run the requested assembly step over whatever succeeded.
    ///
    /// Validation and quota failures abort before any provider call.
    /// Per-segment synthesis failures do not; they come back in the
    /// report alongside the surviving clips.
    pub async fn generate(
        &self,
        session: &mut Session,
        assembly: Assembly,
    ) -> Result<GenerateReport> {
        let invalid = session.script.validate();
        if !invalid.is_empty() {
            return Err(TtsError::Validation { positions: invalid });
        }

        let current = match self.store.generation_count(session.user_id()).await {
            Ok(count) => count,
            Err(e) => {
                // Count unavailable: proceed as zero, see DESIGN.md
                log::warn!(
                    "could not read generation count for {}: {}",
                    session.user_id(),
                    e
                );
                0
            }
        };
        if let QuotaDecision::Deny(reason) =
            self.guard.check_generations(current, session.script.len())
        {
            return Err(TtsError::QuotaExceeded {
                kind: QuotaKind::Generation,
                reason,
            });
        }

        let batch = BatchSynthesizer::new(&*self.provider, &*self.store, &self.output_root);
        let outcome = batch.generate(&session.script, &session.user_id).await?;

        session.last_clips = outcome.clips.iter().map(|c| c.path.clone()).collect();

        let artifact = match assembly {
            Assembly::Individual => None,
            _ if outcome.clips.is_empty() => {
                log::warn!("no clips produced, nothing to assemble");
                None
            }
            Assembly::Merge => {
                let assembler = AudioAssembler::new(&self.output_root);
                Some(assembler.merge_or_archive(&outcome.clips).await?)
            }
            Assembly::Zip => {
                let assembler = AudioAssembler::new(&self.output_root);
                Some(assembler.archive(&outcome.clips)?)
            }
        };

        Ok(GenerateReport { outcome, artifact })
    }

    /// Fetch the provider voice catalog into the session cache. On failure
    /// the stale cache is kept, so an offline editor still sees voices.
    pub async fn refresh_voices(&self, session: &mut Session) -> Result<()> {
        match self.provider.list_voices().await {
            Ok(voices) => {
                session.voices = voices;
                Ok(())
            }
            Err(e) => {
                log::warn!("could not refresh voice list: {}", e);
                Err(e)
            }
        }
    }

    /// Clone a voice from a sample and refresh the session's catalog on
    /// success.
    pub async fn clone_voice(
        &self,
        session: &mut Session,
        sample: &Path,
        requested_name: &str,
    ) -> CloneOutcome {
        let coordinator = VoiceCloneCoordinator::new(
            &*self.provider,
            &*self.store,
            &self.guard,
            &self.samples_root,
        );
        let outcome = coordinator
            .clone_voice(session.user_id(), sample, requested_name)
            .await;

        if matches!(outcome, CloneOutcome::Created { .. }) {
            // Best effort; the clone already succeeded.
            let _ = self.refresh_voices(session).await;
        }
        outcome
    }

    /// Delete a cloned voice: provider first, then the record.
    pub async fn delete_voice(&self, session: &mut Session, voice_id: &str) -> Result<()> {
        self.provider.delete_voice(voice_id).await?;
        self.store
            .delete_voice(session.user_id(), voice_id)
            .await?;
        let _ = self.refresh_voices(session).await;
        Ok(())
    }

    /// The user's cloned-voice records.
    pub async fn user_voices(&self, session: &Session) -> Result<Vec<VoiceRecord>> {
        self.store.list_voices(session.user_id()).await
    }

    /// The user's generation history, newest first.
    pub async fn history(&self, session: &Session) -> Result<Vec<GenerationRecord>> {
        self.store.list_generations(session.user_id()).await
    }

    /// Current counters and limits for display.
    pub async fn usage(&self, session: &Session) -> Result<UsageSummary> {
        let voices_used = self.store.voice_count(session.user_id()).await?;
        let generations_used = self.store.generation_count(session.user_id()).await?;
        Ok(UsageSummary {
            voices_used,
            generations_used,
            limits: self.guard.limits(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::MockProvider;
    use crate::segment::Segment;
    use crate::store::MemoryStore;
    use tempfile::TempDir;

    fn pipeline_with(provider: MockProvider, dir: &TempDir) -> Pipeline {
        Pipeline::new(
            Box::new(provider),
            Box::new(MemoryStore::new()),
            QuotaLimits::default(),
            dir.path().join("out"),
            dir.path().join("samples"),
        )
    }

    fn session_with_script(texts: &[&str]) -> Session {
        let mut session = Session::new("alice");
        session.script = Script::from_segments(
            texts
                .iter()
                .map(|t| Segment::with_content(*t, "voice-1", "Rachel"))
                .collect(),
        );
        session
    }

    #[tokio::test]
    async fn test_generate_individual_clips() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(MockProvider::always_succeeds(b"mp3"), &dir);
        let mut session = session_with_script(&["one", "two"]);

        let report = pipeline
            .generate(&mut session, Assembly::Individual)
            .await
            .unwrap();

        assert_eq!(report.outcome.clips.len(), 2);
        assert!(report.artifact.is_none());
        assert_eq!(session.last_clips().len(), 2);
    }

    #[tokio::test]
    async fn test_generate_rejects_invalid_script() {
        let dir = TempDir::new().unwrap();
        let provider = MockProvider::always_succeeds(b"mp3");
        let pipeline = pipeline_with(provider, &dir);
        let mut session = Session::new("alice");
        // Fresh session script has one empty segment.

        let err = pipeline
            .generate(&mut session, Assembly::Individual)
            .await
            .unwrap_err();

        match err {
            TtsError::Validation { positions } => assert_eq!(positions, vec![1]),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_generate_rejects_oversized_batch() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(MockProvider::always_succeeds(b"mp3"), &dir);
        let mut session =
            session_with_script(&["1", "2", "3", "4", "5", "6"]);

        let err = pipeline
            .generate(&mut session, Assembly::Individual)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            TtsError::QuotaExceeded {
                kind: QuotaKind::Generation,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_quota_counts_accumulate_across_batches() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(MockProvider::always_succeeds(b"mp3"), &dir);

        let mut session = session_with_script(&["one", "two", "three"]);
        pipeline
            .generate(&mut session, Assembly::Individual)
            .await
            .unwrap();

        // 3 of 5 used; another 3 no longer fit.
        let mut second = session_with_script(&["four", "five", "six"]);
        let err = pipeline
            .generate(&mut second, Assembly::Individual)
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::QuotaExceeded { .. }));

        // But 2 still do.
        let mut third = session_with_script(&["four", "five"]);
        assert!(pipeline
            .generate(&mut third, Assembly::Individual)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_zip_assembly_produces_archive() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(MockProvider::always_succeeds(b"mp3"), &dir);
        let mut session = session_with_script(&["one", "two"]);

        let report = pipeline
            .generate(&mut session, Assembly::Zip)
            .await
            .unwrap();

        let artifact = report.artifact.expect("archive expected");
        assert!(matches!(artifact, Artifact::Archive(_)));
        assert!(artifact.path().exists());
    }

    #[tokio::test]
    async fn test_assembly_skipped_when_no_clips() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(MockProvider::always_fails(), &dir);
        let mut session = session_with_script(&["one"]);

        let report = pipeline
            .generate(&mut session, Assembly::Zip)
            .await
            .unwrap();

        assert!(report.artifact.is_none());
        assert_eq!(report.outcome.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_usage_summary() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(MockProvider::always_succeeds(b"mp3"), &dir);
        let mut session = session_with_script(&["one", "two"]);

        pipeline
            .generate(&mut session, Assembly::Individual)
            .await
            .unwrap();

        let usage = pipeline.usage(&session).await.unwrap();
        assert_eq!(usage.generations_used, 2);
        assert_eq!(usage.generations_remaining(), 3);
        assert_eq!(usage.voices_used, 0);
        assert_eq!(usage.voices_remaining(), 1);
    }

    #[tokio::test]
    async fn test_voice_catalog_refresh_and_lookup() {
        let dir = TempDir::new().unwrap();
        let pipeline = pipeline_with(MockProvider::always_succeeds(b"mp3"), &dir);
        let mut session = Session::new("alice");

        assert!(session.voices().is_empty());
        pipeline.refresh_voices(&mut session).await.unwrap();
        assert_eq!(session.voices().len(), 1);
        assert!(session.voice_by_name("mock").is_some());
        assert!(session.voice_by_name("other").is_none());
    }
}
