//! Multi-speaker TTS pipeline
//!
//! Turns an ordered script of (text, voice) segments into audio through a
//! speech-synthesis provider, with per-user quotas, partial-failure
//! tolerance, and deterministic assembly into a merged file or an archive.
//! The presentation layer (the `voicecast` binary, or any other front-end)
//! drives everything through [`session::Pipeline`].

pub mod assemble;
pub mod batch;
pub mod config;
pub mod error;
pub mod provider;
pub mod providers;
pub mod quota;
pub mod segment;
pub mod session;
pub mod store;
pub mod voice_clone;

pub use assemble::{Artifact, AudioAssembler};
pub use batch::{BatchOutcome, BatchSynthesizer, SegmentError, SynthesizedClip};
pub use config::VoicecastConfig;
pub use error::{Result, TtsError};
pub use provider::{SpeechProvider, VoiceInfo, VoiceSettings};
pub use providers::{ElevenLabsProvider, MockProvider};
pub use quota::{DenyReason, QuotaDecision, QuotaGuard, QuotaKind, QuotaLimits};
pub use segment::{Script, Segment};
pub use session::{Assembly, GenerateReport, Pipeline, Session, UsageSummary};
pub use store::{GenerationRecord, UsageStore, VoiceRecord};
pub use voice_clone::{CloneOutcome, VoiceCloneCoordinator};
