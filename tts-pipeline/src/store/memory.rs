//! In-process store
//!
//! Used by tests and by runs configured without a remote store. Counts are
//! lost when the process exits, which also means quotas reset; a durable
//! deployment should configure the REST store instead.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{GenerationRecord, UsageStore, VoiceRecord};
use crate::error::{Result, TtsError};

#[derive(Default)]
pub struct MemoryStore {
    voices: Mutex<HashMap<String, Vec<VoiceRecord>>>,
    generations: Mutex<HashMap<String, Vec<GenerationRecord>>>,
    fail_inserts: AtomicBool,
    fail_counts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force subsequent inserts to fail. Lets tests exercise the
    /// record-write failure paths without a remote store.
    pub fn set_fail_inserts(&self, fail: bool) {
        self.fail_inserts.store(fail, Ordering::SeqCst);
    }

    /// Force subsequent count reads to fail.
    pub fn set_fail_counts(&self, fail: bool) {
        self.fail_counts.store(fail, Ordering::SeqCst);
    }

    fn check_insert(&self) -> Result<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(TtsError::Store("insert rejected".to_string()));
        }
        Ok(())
    }

    fn check_count(&self) -> Result<()> {
        if self.fail_counts.load(Ordering::SeqCst) {
            return Err(TtsError::Store("count unavailable".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl UsageStore for MemoryStore {
    async fn voice_count(&self, user_id: &str) -> Result<usize> {
        self.check_count()?;
        let voices = self.voices.lock().unwrap();
        Ok(voices.get(user_id).map(|v| v.len()).unwrap_or(0))
    }

    async fn generation_count(&self, user_id: &str) -> Result<usize> {
        self.check_count()?;
        let generations = self.generations.lock().unwrap();
        Ok(generations.get(user_id).map(|g| g.len()).unwrap_or(0))
    }

    async fn insert_voice(&self, record: &VoiceRecord) -> Result<()> {
        self.check_insert()?;
        let mut voices = self.voices.lock().unwrap();
        voices
            .entry(record.user_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn insert_generation(&self, record: &GenerationRecord) -> Result<()> {
        self.check_insert()?;
        let mut generations = self.generations.lock().unwrap();
        generations
            .entry(record.user_id.clone())
            .or_default()
            .push(record.clone());
        Ok(())
    }

    async fn list_voices(&self, user_id: &str) -> Result<Vec<VoiceRecord>> {
        let voices = self.voices.lock().unwrap();
        Ok(voices.get(user_id).cloned().unwrap_or_default())
    }

    async fn list_generations(&self, user_id: &str) -> Result<Vec<GenerationRecord>> {
        let generations = self.generations.lock().unwrap();
        let mut records = generations.get(user_id).cloned().unwrap_or_default();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete_voice(&self, user_id: &str, voice_id: &str) -> Result<()> {
        let mut voices = self.voices.lock().unwrap();
        if let Some(records) = voices.get_mut(user_id) {
            records.retain(|r| r.voice_id != voice_id);
        }
        Ok(())
    }
}
