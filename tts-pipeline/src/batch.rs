//! Batch synthesis
//!
//! Walks the script in order, synthesizes each segment, and writes each
//! clip to the output root. One failing segment never blocks the rest:
//! failures are collected per position and the loop keeps going. A clip
//! whose generation record cannot be written is still kept; the quota
//! count undercounts in that case (see DESIGN.md).

use chrono::Utc;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::Result;
use crate::provider::SpeechProvider;
use crate::segment::Script;
use crate::store::{GenerationRecord, UsageStore};

/// One synthesized segment, written to disk. Ordinal is the 1-based
/// position in the source script, which is also merge order.
#[derive(Debug, Clone)]
pub struct SynthesizedClip {
    pub segment_id: String,
    pub ordinal: usize,
    pub path: PathBuf,
    pub byte_len: u64,
}

/// A per-segment failure, tagged with the 1-based script position.
#[derive(Debug, Clone)]
pub struct SegmentError {
    pub position: usize,
    pub message: String,
}

impl fmt::Display for SegmentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment {}: {}", self.position, self.message)
    }
}

/// Result of one batch. Every script segment lands in exactly one of the
/// two lists; clips keep script order.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub clips: Vec<SynthesizedClip>,
    pub errors: Vec<SegmentError>,
}

impl BatchOutcome {
    pub fn fully_succeeded(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct BatchSynthesizer<'a> {
    provider: &'a dyn SpeechProvider,
    store: &'a dyn UsageStore,
    output_root: &'a Path,
}

impl<'a> BatchSynthesizer<'a> {
    pub fn new(
        provider: &'a dyn SpeechProvider,
        store: &'a dyn UsageStore,
        output_root: &'a Path,
    ) -> Self {
        Self {
            provider,
            store,
            output_root,
        }
    }

    /// Synthesize every segment of an already-validated, already-authorized
    /// script. Returns Err only for environment problems (e.g. the output
    /// directory cannot be created); provider failures are per-segment.
    pub async fn generate(&self, script: &Script, user_id: &str) -> Result<BatchOutcome> {
        tokio::fs::create_dir_all(self.output_root).await?;

        let mut outcome = BatchOutcome::default();

        for (index, segment) in script.segments().iter().enumerate() {
            let position = index + 1;

            let Some(voice_id) = segment.voice_id() else {
                // Callers validate first, so this only fires on misuse;
                // treat it as one more per-segment failure.
                outcome.errors.push(SegmentError {
                    position,
                    message: "no voice assigned".to_string(),
                });
                continue;
            };

            match self.provider.synthesize(&segment.text, voice_id).await {
                Ok(audio) => {
                    let path = self
                        .output_root
                        .join(format!("{}.mp3", Uuid::new_v4().simple()));

                    if let Err(e) = tokio::fs::write(&path, &audio).await {
                        outcome.errors.push(SegmentError {
                            position,
                            message: format!("failed to write clip: {}", e),
                        });
                        continue;
                    }

                    log::info!(
                        "synthesized segment {} ({} bytes) -> {}",
                        position,
                        audio.len(),
                        path.display()
                    );

                    outcome.clips.push(SynthesizedClip {
                        segment_id: segment.id().to_string(),
                        ordinal: position,
                        path,
                        byte_len: audio.len() as u64,
                    });

                    let record = GenerationRecord {
                        user_id: user_id.to_string(),
                        text: segment.text.clone(),
                        voice_id: voice_id.to_string(),
                        voice_label: segment.voice_label().to_string(),
                        created_at: Utc::now(),
                    };
                    if let Err(e) = self.store.insert_generation(&record).await {
                        log::warn!(
                            "failed to record generation for segment {}: {}",
                            position,
                            e
                        );
                    }
                }
                Err(e) => {
                    log::warn!("synthesis failed for segment {}: {}", position, e);
                    outcome.errors.push(SegmentError {
                        position,
                        message: e.to_string(),
                    });
                }
            }
        }

        Ok(outcome)
    }
}
