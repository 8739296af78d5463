//! Usage records and the store trait
//!
//! The store is an eventually-available record keeper: it holds one row per
//! cloned voice and one per successful generation, and the pipeline only
//! ever asks it for per-user counts, lists, inserts, and deletes.

mod memory;
mod rest;

pub use memory::MemoryStore;
pub use rest::RestStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row per cloned voice. Count per user must never exceed the voice cap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceRecord {
    pub user_id: String,
    pub voice_id: String,
    pub voice_name: String,
    pub created_at: DateTime<Utc>,
}

/// One row per successfully synthesized segment. Append-only; drives the
/// per-user generation count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub user_id: String,
    pub text: String,
    pub voice_id: String,
    pub voice_label: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait UsageStore: Send + Sync {
    async fn voice_count(&self, user_id: &str) -> Result<usize>;

    async fn generation_count(&self, user_id: &str) -> Result<usize>;

    async fn insert_voice(&self, record: &VoiceRecord) -> Result<()>;

    async fn insert_generation(&self, record: &GenerationRecord) -> Result<()>;

    async fn list_voices(&self, user_id: &str) -> Result<Vec<VoiceRecord>>;

    /// Newest first.
    async fn list_generations(&self, user_id: &str) -> Result<Vec<GenerationRecord>>;

    async fn delete_voice(&self, user_id: &str, voice_id: &str) -> Result<()>;
}
